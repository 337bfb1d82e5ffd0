use crate::algebra::*;
use crate::io::ConfigurablePrintTarget;
use std::io::Write;

use super::*;
use crate::solver::core::traits::{InfoPrint, StepAction};
use std::time::Duration;

impl<T> ConfigurablePrintTarget for DefaultInfo<T> {
    fn print_to_stdout(&mut self) {
        self.stream.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.stream.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.stream.print_to_stream(stream)
    }
    fn print_to_buffer(&mut self) {
        self.stream.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.stream.get_print_buffer()
    }
}

macro_rules! expformat {
    ($fmt:expr,$val:expr) => {
        if $val.is_finite() {
            _exp_str_reformat(format!($fmt, $val))
        } else {
            format!($fmt, $val)
        }
    };
}

const RULE: &str = "---------------------------------------------------------------";

impl<T> InfoPrint<T> for DefaultInfo<T>
where
    T: FloatT,
{
    type D = DefaultProblemData<T>;
    type SE = DefaultSettings<T>;

    fn print_configuration(
        &mut self,
        settings: &DefaultSettings<T>,
        data: &DefaultProblemData<T>,
    ) -> std::io::Result<()> {
        if !settings.verbose {
            return std::io::Result::Ok(());
        }

        let out = &mut self.stream;

        writeln!(out, "\ndasqp v{}  -  dual active set QP solver", crate::VERSION)?;
        writeln!(out, "\nproblem:")?;
        writeln!(out, "  variables     = {}", data.n)?;
        writeln!(out, "  equalities    = {}", data.me)?;
        writeln!(
            out,
            "  inequalities  = {} ({} bounded)",
            data.mi,
            data.finite_rows.len()
        )?;
        writeln!(out, "  nnz(H)        = {}", data.H.nnz())?;
        writeln!(out, "  nnz(A)        = {}", data.At.nnz())?;
        writeln!(out, "  nnz(B)        = {}", data.Bt.nnz())?;
        writeln!(out,)?;

        self.print_settings(settings)?;

        std::io::Result::Ok(())
    }

    fn print_status_header(&mut self, settings: &DefaultSettings<T>) -> std::io::Result<()> {
        if !settings.verbose {
            return std::io::Result::Ok(());
        }

        let out = &mut self.stream;

        //print a subheader for the iterations info
        write!(out, "iter  ")?;
        write!(out, "active  ")?;
        write!(out, "viol    ")?;
        write!(out, "pstep      ")?;
        write!(out, "dstep      ")?;
        write!(out, "action")?;
        writeln!(out,)?;
        writeln!(out, "{}", RULE)?;
        out.flush()?;
        std::io::Result::Ok(())
    }

    fn print_status(&mut self, settings: &DefaultSettings<T>) -> std::io::Result<()> {
        if !settings.verbose {
            return std::io::Result::Ok(());
        }

        let out = &mut self.stream;

        write!(out, "{:>4}  ", self.iterations)?;
        write!(out, "{:>6}  ", self.n_active)?;
        write!(out, "{:>6}  ", self.num_violated)?;
        write!(out, "{}  ", _step_str(self.primal_step))?;
        write!(out, "{}  ", _step_str(self.dual_step))?;
        write!(out, "{}", self.action)?;
        writeln!(out,)?;

        std::io::Result::Ok(())
    }

    fn print_message(&mut self, settings: &DefaultSettings<T>, msg: &str) -> std::io::Result<()> {
        if !settings.verbose {
            return std::io::Result::Ok(());
        }
        writeln!(self.stream, "  {}", msg)
    }

    fn print_footer(&mut self, settings: &DefaultSettings<T>) -> std::io::Result<()> {
        if !settings.verbose {
            return std::io::Result::Ok(());
        }

        let out = &mut self.stream;

        writeln!(out, "{}", RULE)?;

        writeln!(out, "Terminated with status = {}", self.status)?;
        if matches!(self.action, StepAction::Failed) {
            if let Some(msg) = self.diagnostics.last() {
                writeln!(out, "  reason: {}", msg)?;
            }
        }
        writeln!(out, "  objective       = {}", expformat!("{:+.6e}", self.obj_val))?;
        writeln!(out, "  constraint sat. = {}", expformat!("{:.2e}", self.cons_sat))?;
        writeln!(out, "  lagrangian res. = {}", expformat!("{:.2e}", self.lag_res))?;
        writeln!(out, "  complementarity = {}", expformat!("{:.2e}", self.complementarity))?;
        writeln!(out, "  non-negativity  = {}", expformat!("{:.2e}", self.nonneg))?;
        writeln!(out, "  iterations      = {}", self.iterations)?;
        writeln!(out, "  kkt backend     = {}", self.backend)?;

        writeln!(
            out,
            "solve time = {:?}",
            Duration::from_secs_f64(self.solve_time)
        )?;
        out.flush()?;

        std::io::Result::Ok(())
    }
}

impl<T> DefaultInfo<T>
where
    T: FloatT,
{
    fn print_settings(&mut self, settings: &DefaultSettings<T>) -> std::io::Result<()> {
        let out = &mut self.stream;

        let set = settings;

        writeln!(out, "settings:")?;

        writeln!(
            out,
            "  mode = {}, kkt backend = {}, precision: {} bit",
            set.mode,
            set.kkt_backend,
            _get_precision_string::<T>()
        )?;

        writeln!(
            out,
            "  max iter = {}, eps_abs = {:.1e}, feas tol = {:.1e}, step tol = {:.1e}",
            set.max_iter, set.eps_abs, set.feasibility_tolerance, set.step_tolerance
        )?;

        writeln!(
            out,
            "  static reg : ϵ = {:.1e}",
            set.static_regularization_constant,
        )?;

        writeln!(
            out,
            "  dynamic reg: ϵ = {:.1e}, δ = {:.1e}",
            set.dynamic_regularization_eps, set.dynamic_regularization_delta
        )?;

        writeln!(
            out,
            "  iter refine: {}, reltol = {:.1e}, abstol = {:.1e},",
            _bool_on_off(set.iterative_refinement_enable),
            set.iterative_refinement_reltol,
            set.iterative_refinement_abstol
        )?;

        writeln!(
            out,
            "               max iter = {}, stop ratio = {:.1}",
            set.iterative_refinement_max_iter, set.iterative_refinement_stop_ratio
        )?;

        writeln!(
            out,
            "  scaling    : {}, min_scale = {:.1e}, max_scale = {:.1e}",
            _scaling_str(set.scaling),
            set.equilibrate_min_scaling,
            set.equilibrate_max_scaling
        )?;

        writeln!(out,)?;

        std::io::Result::Ok(())
    }
}

fn _bool_on_off(v: bool) -> &'static str {
    match v {
        true => "on",
        false => "off",
    }
}

fn _scaling_str(scaling: i32) -> String {
    match scaling {
        0 => "off".to_string(),
        s if s > 0 => format!("ruiz ({} passes)", s),
        _ => "diagonal".to_string(),
    }
}

fn _step_str<T: FloatT>(step: Option<T>) -> String {
    match step {
        Some(t) => format!("{:<9}", expformat!("{:.2e}", t)),
        None => format!("{:<9}", "-"),
    }
}

fn _get_precision_string<T: FloatT>() -> String {
    (::std::mem::size_of::<T>() * 8).to_string()
}

// convert a string in LowerExp display format into one that
// 1) always has a sign after the exponent, and
// 2) has at least two digits in the exponent.

fn _exp_str_reformat(mut thestr: String) -> String {
    // a finite value in LowerExp format always contains 'e'
    let Some(eidx) = thestr.find('e') else {
        return thestr;
    };
    let has_sign = thestr[eidx + 1..].starts_with('-');

    let has_short_exp = {
        if !has_sign {
            thestr.len() == eidx + 2
        } else {
            thestr.len() == eidx + 3
        }
    };

    let chars = match (has_sign, has_short_exp) {
        (false, true) => "+0",
        (false, false) => "+",
        (true, true) => "0",
        (true, false) => "",
    };

    let shift = if has_sign { 2 } else { 1 };
    thestr.insert_str(eidx + shift, chars);
    thestr
}

#[test]
fn test_exp_str_reformat() {
    assert_eq!(_exp_str_reformat(format!("{:.2e}", 1.5e-3)), "1.50e-03");
    assert_eq!(_exp_str_reformat(format!("{:.2e}", 2.0)), "2.00e+00");
    assert_eq!(_exp_str_reformat(format!("{:.2e}", 3e120)), "3.00e+120");
    assert_eq!(_step_str::<f64>(None).trim(), "-");
    assert_eq!(_scaling_str(-1), "diagonal");
}
