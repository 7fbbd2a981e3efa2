//! Best-effort name and parameter extraction from a callable's source text

use super::value::FunctionValue;
use once_cell::sync::Lazy;
use regex::Regex;

/// Shown when no name can be recovered
pub const ANONYMOUS: &str = "<anonymous>";

static SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:function\s*)?([^\s(]*)\s*\(([^)]*)\)").expect("signature pattern is valid")
});

/// Name and parameter text of a callable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: String,
}

impl Signature {
    /// Extract a signature from the callable's source.
    ///
    /// Falls back to the declared name, then to [`ANONYMOUS`]. Never fails.
    pub fn extract(function: &FunctionValue) -> Self {
        let captures = SIGNATURE.captures(&function.source);

        let parsed_name = captures
            .as_ref()
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|name| !name.is_empty());
        let name = parsed_name
            .map(str::to_string)
            .or_else(|| function.name.clone().filter(|name| !name.is_empty()))
            .unwrap_or_else(|| ANONYMOUS.to_string());

        let params = captures
            .as_ref()
            .and_then(|c| c.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Self { name, params }
    }

    /// `ƒ name(params)`
    pub fn display(&self) -> String {
        format!("ƒ {}({})", self.name, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(name: Option<&str>, source: &str) -> FunctionValue {
        FunctionValue {
            name: name.map(str::to_string),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_named_function() {
        let sig = Signature::extract(&func(None, "function encodeStanza(node, opts) { return 1 }"));
        assert_eq!(sig.name, "encodeStanza");
        assert_eq!(sig.params, "node, opts");
        assert_eq!(sig.display(), "ƒ encodeStanza(node, opts)");
    }

    #[test]
    fn test_arrow_function_is_anonymous() {
        let sig = Signature::extract(&func(None, "(a, b) => a + b"));
        assert_eq!(sig.name, ANONYMOUS);
        assert_eq!(sig.params, "a, b");
    }

    #[test]
    fn test_declared_name_fallback() {
        let sig = Signature::extract(&func(Some("bound"), "[native code]"));
        assert_eq!(sig.name, "bound");
        assert_eq!(sig.params, "");
    }
}
