//! Ordered string lists.
//!
//! A list is written either as a JSON array or as a single comma-separated
//! string. Tokens of the string form are taken verbatim: `"a, b"` yields
//! `"a"` and `" b"`.

use crate::base::neterror::NetError;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Decodes `data` as either a JSON array of `T` or a comma-separated string.
///
/// The two attempts are independent: a failed array decode leaves nothing
/// behind for the string decode. Returns `Ok(None)` for JSON `null`.
pub(crate) fn decode_list<T, F>(data: &[u8], from_token: F) -> Result<Option<Vec<T>>, NetError>
where
    T: DeserializeOwned,
    F: Fn(&str) -> T,
{
    if let Ok(items) = serde_json::from_slice::<Option<Vec<T>>>(data) {
        return Ok(items);
    }

    if let Ok(raw) = serde_json::from_slice::<String>(data) {
        return Ok(Some(raw.split(',').map(from_token).collect()));
    }

    Err(NetError::malformed_list(data))
}

/// Re-encodes a JSON value that serde already parsed so the byte-level
/// decoders can run on it. Missing fields arrive here as `None`.
pub(crate) fn value_bytes(value: &Option<Value>) -> Vec<u8> {
    match value {
        Some(value) => value.to_string().into_bytes(),
        None => b"null".to_vec(),
    }
}

/// An ordered list of strings. Order is significant to consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StringList(Vec<String>);

impl StringList {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    /// Decodes a raw JSON fragment.
    ///
    /// `null` and `[]` both decode to an empty list.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, NetError> {
        let items = decode_list(data, str::to_string)?.unwrap_or_default();
        Ok(Self(items))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns the canonical runtime value.
    pub fn build(&self) -> Vec<String> {
        self.0.clone()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a StringList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        StringList::from_json_slice(&value_bytes(&value)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_array_form_keeps_order() {
        let list = StringList::from_json_slice(br#"["geosite:cn", "geoip:private", "a"]"#).unwrap();
        assert_eq!(list.build(), strings(&["geosite:cn", "geoip:private", "a"]));
    }

    #[test]
    fn test_array_form_round_trips_unchanged() {
        let cases: [&[&str]; 6] = [
            &[],
            &[""],
            &["a,b", "c"],
            &["", "", ","],
            &["say \"hi\"", "back\\slash", "tab\there"],
            &["bücher.example", "例子.测试", "emoji 🚀"],
        ];

        for items in cases {
            let raw = serde_json::to_vec(items).unwrap();
            let list = StringList::from_json_slice(&raw).unwrap();
            assert_eq!(list.build(), strings(items), "{}", String::from_utf8_lossy(&raw));
        }
    }

    #[test]
    fn test_string_form_splits_on_comma() {
        let list = StringList::from_json_slice(br#""a,b,c""#).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.as_slice(), strings(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn test_string_form_does_not_trim() {
        let list = StringList::from_json_slice(br#"" a ,b""#).unwrap();
        assert_eq!(list.build(), strings(&[" a ", "b"]));
    }

    #[test]
    fn test_empty_string_yields_one_empty_token() {
        let list = StringList::from_json_slice(br#""""#).unwrap();
        assert_eq!(list.build(), strings(&[""]));
    }

    #[test]
    fn test_empty_array_and_null() {
        let empty = StringList::from_json_slice(b"[]").unwrap();
        assert!(empty.is_empty());

        let null = StringList::from_json_slice(b"null").unwrap();
        assert!(null.is_empty());
        assert_eq!(null, StringList::default());
    }

    #[test]
    fn test_malformed_input_reports_raw_bytes() {
        for raw in [&b"42"[..], &b"{\"a\":1}"[..], &b"[1,2]"[..], &b"not json"[..]] {
            let err = StringList::from_json_slice(raw).unwrap_err();
            match err {
                NetError::MalformedListFormat { raw: reported } => assert_eq!(reported, raw),
                other => panic!("Expected MalformedListFormat, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_deserialize_as_field() {
        #[derive(Deserialize)]
        struct Rule {
            domains: StringList,
            #[serde(default)]
            ips: StringList,
        }

        let rule: Rule = serde_json::from_str(r#"{"domains": "a.com,b.com"}"#).unwrap();
        assert_eq!(rule.domains.build(), strings(&["a.com", "b.com"]));
        assert!(rule.ips.is_empty());

        let err = serde_json::from_str::<Rule>(r#"{"domains": 7}"#)
            .err()
            .expect("number is not a list");
        assert!(err.to_string().contains("unknown format of a list: 7"));
    }
}
