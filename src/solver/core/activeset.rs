use super::kktsolvers::ActiveSetEdit;

/// Inequality rows currently enforced as equalities.
///
/// Members are kept in insertion order, which fixes the tie-breaking
/// order of the dual ratio test.  The number of members is tracked
/// separately in `n_active` so that the solver can check that the two
/// never diverge.

#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    members: Vec<usize>,
    mask: Vec<bool>,
    n_active: usize,
}

impl ActiveSet {
    /// An empty active set over `mi` inequality rows
    pub fn new(mi: usize) -> Self {
        Self {
            members: Vec::with_capacity(mi),
            mask: vec![false; mi],
            n_active: 0,
        }
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.mask.fill(false);
        self.n_active = 0;
    }

    /// Apply a single edit.  Returns `false`, leaving the set
    /// unchanged, when adding a member or removing a non-member.
    pub fn apply(&mut self, edit: ActiveSetEdit) -> bool {
        match edit {
            ActiveSetEdit::Add(i) => {
                if i >= self.mask.len() || self.mask[i] {
                    return false;
                }
                self.members.push(i);
                self.mask[i] = true;
                self.n_active += 1;
            }
            ActiveSetEdit::Drop(i) => {
                if i >= self.mask.len() || !self.mask[i] {
                    return false;
                }
                let Some(k) = self.members.iter().position(|&j| j == i) else {
                    return false;
                };
                self.members.remove(k);
                self.mask[i] = false;
                self.n_active -= 1;
            }
        }
        true
    }

    pub fn contains(&self, i: usize) -> bool {
        self.mask.get(i).copied().unwrap_or(false)
    }

    /// the separately tracked member count
    pub fn n_active(&self) -> usize {
        self.n_active
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// members in insertion order
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.members.iter()
    }

    /// number of inequality rows covered by the mask
    pub fn capacity(&self) -> usize {
        self.mask.len()
    }
}

impl<'a> IntoIterator for &'a ActiveSet {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_active_set_edits() {
        let mut set = ActiveSet::new(4);
        assert!(set.is_empty());

        assert!(set.apply(ActiveSetEdit::Add(2)));
        assert!(set.apply(ActiveSetEdit::Add(0)));
        assert!(set.apply(ActiveSetEdit::Add(3)));
        assert_eq!(set.members(), &[2, 0, 3]);
        assert_eq!(set.n_active(), set.len());

        // duplicate add, missing drop, out of range
        assert!(!set.apply(ActiveSetEdit::Add(0)));
        assert!(!set.apply(ActiveSetEdit::Drop(1)));
        assert!(!set.apply(ActiveSetEdit::Add(4)));
        assert_eq!(set.len(), 3);

        // removal keeps the order of the others
        assert!(set.apply(ActiveSetEdit::Drop(0)));
        assert_eq!(set.members(), &[2, 3]);
        assert!(!set.contains(0));
        assert!(set.contains(3));
        assert_eq!(set.n_active(), 2);

        set.clear();
        assert_eq!(set.n_active(), 0);
        assert!(!set.contains(2));
        assert_eq!(set.capacity(), 4);
    }
}
