#![allow(non_snake_case)]
use crate::{
    algebra::*,
    solver::{DefaultSettings, DefaultSolver, SolverError},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, io, io::Read};

/// Save a problem and its settings to JSON and read it back
pub trait SolverJSONReadWrite: Sized {
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error>;
    fn read_from_file(file: &mut File) -> Result<Self, io::Error>;
}

// A struct very similar to the problem data, but containing only
// the data types provided by the user (i.e. no internal types).

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
struct JsonProblemData<T: FloatT> {
    pub H: CscMatrix<T>,
    pub q: Vec<T>,
    pub A: CscMatrix<T>,
    pub a: Vec<T>,
    pub B: CscMatrix<T>,
    pub b: Vec<T>,
    pub settings: DefaultSettings<T>,
}

impl<T> SolverJSONReadWrite for DefaultSolver<T>
where
    T: FloatT + DeserializeOwned + Serialize,
{
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        let data = &self.data;
        let mut json_data = JsonProblemData {
            H: data.H.clone(),
            q: data.q.clone(),
            A: data.At.clone(),
            a: data.a.clone(),
            B: data.Bt.clone(),
            b: data.b.clone(),
            settings: self.settings.clone(),
        };

        // restore scaling to original
        let equil = &data.equilibration;
        let cinv = equil.c.recip();

        json_data.H.lrscale(&equil.dinv, &equil.dinv);
        json_data.H.scale(cinv);
        json_data.q.hadamard(&equil.dinv).scale(cinv);
        json_data.A.lrscale(&equil.dinv, &equil.eainv);
        json_data.a.hadamard(&equil.eainv);
        json_data.B.lrscale(&equil.dinv, &equil.ebinv);
        json_data.b.hadamard(&equil.ebinv);

        // constraints are held transposed
        json_data.A = json_data.A.transpose();
        json_data.B = json_data.B.transpose();

        // infinite bounds can't be serialized
        sanitize_bounds(&mut json_data.b);

        // write to file
        let json = serde_json::to_string(&json_data)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }

    fn read_from_file(file: &mut File) -> Result<Self, io::Error> {
        // read file
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let mut json_data: JsonProblemData<T> = serde_json::from_str(&buffer)?;

        // restore sanitized bounds to their original values
        desanitize_bounds(&mut json_data.b);

        // create a solver object
        let JsonProblemData {
            H,
            q,
            A,
            a,
            B,
            b,
            settings,
        } = json_data;
        Self::new(&H, &q, &A, &a, &B, &b, settings).map_err(invalid_data)
    }
}

fn invalid_data(e: SolverError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

fn sanitize_bounds<T: FloatT>(b: &mut [T]) {
    for bi in b.iter_mut().filter(|bi| **bi == T::infinity()) {
        *bi = T::max_value();
    }
}

fn desanitize_bounds<T: FloatT>(b: &mut [T]) {
    for bi in b.iter_mut().filter(|bi| **bi == T::max_value()) {
        *bi = T::infinity();
    }
}

#[test]
fn test_json_io() {
    use crate::solver::ActiveSetSolver;
    use std::io::{Seek, SeekFrom};

    let H = CscMatrix::from(&[
        [2., 0.], //
        [0., 2.], //
    ]);
    let q = [-2., -2.];
    let A = CscMatrix::from(&[[1., -1.]]);
    let a = [0.];
    let B = CscMatrix::from(&[
        [1., 1.], //
        [0., 1.], //
    ]);
    let b = [1., f64::INFINITY];

    let settings = crate::solver::DefaultSettingsBuilder::default()
        .scaling(5)
        .build()
        .unwrap();

    let mut solver = DefaultSolver::<f64>::new(&H, &q, &A, &a, &B, &b, settings).unwrap();
    solver.solve();

    // write the problem to a file
    let mut file = tempfile::tempfile().unwrap();
    solver.write_to_file(&mut file).unwrap();

    // read the problem from the file
    file.seek(SeekFrom::Start(0)).unwrap();
    let mut solver2 = DefaultSolver::<f64>::read_from_file(&mut file).unwrap();
    assert_eq!(solver2.data.b[1], f64::INFINITY);
    solver2.solve();
    assert_eq!(solver.solution.status, solver2.solution.status);
    assert!(solver.solution.x.norm_inf_diff(&solver2.solution.x) < 1e-12);
}
