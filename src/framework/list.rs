use serde::Deserialize;

/// The `{ "count": …, "value": [ … ] }` envelope the service wraps collections in.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

impl<T> ListResponse<T> {
    /// Returns whether the collection holds anything, trusting either field.
    pub fn is_empty(&self) -> bool {
        self.count == 0 && self.value.is_empty()
    }
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            count: 0,
            value: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_decode_as_empty() {
        let list: ListResponse<u32> = serde_json::from_str("{}").unwrap();
        assert!(list.is_empty());

        let list: ListResponse<u32> = serde_json::from_str(r#"{"count":2}"#).unwrap();
        assert!(!list.is_empty());
        assert!(list.value.is_empty());
    }
}
