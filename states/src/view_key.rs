use std::fmt::{Display, Formatter};

use ustr::Ustr;

/// Identifier of one independently paginated collection inside a registry.
///
/// Keys are interned, so copying and comparing them is cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey(Ustr);

impl ViewKey {
    pub fn new(name: &str) -> Self {
        Self(Ustr::from(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ViewKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Display for ViewKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
