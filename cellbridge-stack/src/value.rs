use std::fmt;
use std::sync::Arc;

use cellbridge_core::Cell;
use indexmap::IndexSet;
use num_bigint::BigInt;

/// An interned symbol.
///
/// Two atoms from the same [`AtomTable`] are equal exactly when they were
/// interned under the same name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Atom {
    index: usize,
    name: Arc<str>,
}

impl Atom {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the atom in its table.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Interning table for atoms, in first-interned order.
#[derive(Debug, Default)]
pub struct AtomTable {
    names: IndexSet<Arc<str>>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the atom for `name`, creating it on first use.
    pub fn intern(&mut self, name: &str) -> Atom {
        if let Some(atom) = self.lookup(name) {
            return atom;
        }
        let name: Arc<str> = Arc::from(name);
        let (index, _) = self.names.insert_full(name.clone());
        Atom { index, name }
    }

    /// Returns the atom for `name` only if it was interned before.
    pub fn lookup(&self, name: &str) -> Option<Atom> {
        self.names.get_full(name).map(|(index, name)| Atom {
            index,
            name: name.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A value held by the operand stack.
#[derive(Clone, Debug, PartialEq)]
pub enum StackValue {
    Int(BigInt),
    String(String),
    Cell(Arc<Cell>),
    Atom(Atom),
    Tuple(Vec<StackValue>),
}

impl StackValue {
    /// Short name of the variant, used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            StackValue::Int(_) => "integer",
            StackValue::String(_) => "string",
            StackValue::Cell(_) => "cell",
            StackValue::Atom(_) => "atom",
            StackValue::Tuple(_) => "tuple",
        }
    }

    /// Builds the `[key value]` pair used for keyed tuples.
    pub fn pair(key: Atom, value: StackValue) -> Self {
        StackValue::Tuple(vec![StackValue::Atom(key), value])
    }
}

impl fmt::Display for StackValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackValue::Int(n) => write!(f, "{}", n),
            StackValue::String(s) => write!(f, "{:?}", s),
            StackValue::Cell(c) => write!(f, "C{{{}}}", c.hash()),
            StackValue::Atom(a) => write!(f, "{}", a),
            StackValue::Tuple(items) => {
                f.write_str("[")?;
                for item in items {
                    write!(f, " {}", item)?;
                }
                f.write_str(" ]")
            }
        }
    }
}

impl From<BigInt> for StackValue {
    fn from(n: BigInt) -> Self {
        StackValue::Int(n)
    }
}

impl From<i64> for StackValue {
    fn from(n: i64) -> Self {
        StackValue::Int(BigInt::from(n))
    }
}

impl From<i32> for StackValue {
    fn from(n: i32) -> Self {
        StackValue::Int(BigInt::from(n))
    }
}

impl From<String> for StackValue {
    fn from(s: String) -> Self {
        StackValue::String(s)
    }
}

impl From<&str> for StackValue {
    fn from(s: &str) -> Self {
        StackValue::String(s.to_string())
    }
}

impl From<Arc<Cell>> for StackValue {
    fn from(cell: Arc<Cell>) -> Self {
        StackValue::Cell(cell)
    }
}

impl From<Atom> for StackValue {
    fn from(atom: Atom) -> Self {
        StackValue::Atom(atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut table = AtomTable::new();
        let code = table.intern(".code");
        let data = table.intern(".data");
        assert_eq!(table.intern(".code"), code);
        assert_ne!(code, data);
        assert_eq!(code.index(), 0);
        assert_eq!(data.index(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn lookup_does_not_intern() {
        let mut table = AtomTable::new();
        assert!(table.lookup(".balance").is_none());
        assert!(table.is_empty());
        let balance = table.intern(".balance");
        assert_eq!(table.lookup(".balance"), Some(balance));
    }

    #[test]
    fn display_forms() {
        let mut table = AtomTable::new();
        let key = table.intern(".balance");
        let value = StackValue::Tuple(vec![
            StackValue::pair(key, StackValue::from(42)),
            StackValue::from("hi"),
        ]);
        assert_eq!(value.to_string(), r#"[ [ .balance 42 ] "hi" ]"#);
    }

    #[test]
    fn cell_display_uses_hash() {
        let cell = Arc::new(Cell::empty());
        let shown = StackValue::from(cell.clone()).to_string();
        assert_eq!(shown, format!("C{{{}}}", cell.hash()));
    }

    #[test]
    fn type_names() {
        assert_eq!(StackValue::from(1).type_name(), "integer");
        assert_eq!(StackValue::Tuple(vec![]).type_name(), "tuple");
    }
}
