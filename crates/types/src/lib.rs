use std::cmp::Ordering;

/// A column's declared SQL type, as written in a `CREATE TABLE` statement.
///
/// `Varchar` carries its declared length bound `n` (n <= 65535); the
/// semantic analyzer rejects string literals longer than this bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SqlType {
    Int,
    Varchar(u16),
    Bool,
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlType::Int => write!(f, "INT"),
            SqlType::Varchar(n) => write!(f, "VARCHAR({n})"),
            SqlType::Bool => write!(f, "BOOLEAN"),
        }
    }
}

/// A runtime value. `Null` is a distinct value, not a wrapped option, so
/// three-valued logic can pattern-match on it directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Byte-order comparison for same-typed, non-null operands. VARCHAR
    /// comparisons use byte order rather than a collation.
    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn eq_same_type(&self, other: &Value) -> Option<bool> {
        self.cmp_same_type(other).map(|ord| ord == Ordering::Equal)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering::{Equal, Greater, Less};

    #[test]
    fn cmp_same_type_works() {
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Int(2)), Some(Less));
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Text("1".into())), None);
    }

    #[test]
    fn truthiness_is_strict() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Int(1).as_bool(), None);
        assert_eq!(Value::Text("true".into()).as_bool(), None);
        assert_eq!(Value::Null.as_bool(), None);
    }

    #[test]
    fn comparisons_require_same_type() {
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Int(2)), Some(Less));
        assert_eq!(
            Value::Text("a".into()).cmp_same_type(&Value::Text("a".into())),
            Some(Equal)
        );
        assert_eq!(
            Value::Bool(true).cmp_same_type(&Value::Bool(false)),
            Some(Greater)
        );
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Text("1".into())), None);
        assert_eq!(Value::Null.cmp_same_type(&Value::Int(1)), None);
    }

    #[test]
    fn text_comparison_is_byte_order_not_collation() {
        let a = Value::Text("a".into());
        let b = Value::Text("B".into());
        // Byte order: uppercase 'B' (0x42) sorts before lowercase 'a' (0x61).
        assert_eq!(a.cmp_same_type(&b), Some(Greater));
    }

    #[test]
    fn equality_requires_same_type() {
        assert_eq!(Value::Int(1).eq_same_type(&Value::Int(1)), Some(true));
        assert_eq!(Value::Int(1).eq_same_type(&Value::Int(2)), Some(false));
        assert_eq!(Value::Text("1".into()).eq_same_type(&Value::Int(1)), None);
    }

    #[test]
    fn serde_round_trip_stability() {
        let vals = vec![
            Value::Int(-42),
            Value::Text("Ada".into()),
            Value::Bool(true),
            Value::Null,
        ];
        let json = serde_json::to_string(&vals).unwrap();
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(vals, back);
    }

    proptest! {
        #[test]
        fn order_is_antisymmetric(i in any::<i64>(), j in any::<i64>()) {
            let a = Value::Int(i);
            let b = Value::Int(j);
            match (a.cmp_same_type(&b), b.cmp_same_type(&a)) {
                (Some(o1), Some(o2)) => assert_eq!(o1, o2.reverse()),
                _ => prop_assert!(true),
            }
        }

        #[test]
        fn eq_reflexive(val in any::<i64>()) {
            let v = Value::Int(val);
            assert_eq!(v.eq_same_type(&v), Some(true));
        }
    }
}
