//! Thin typed access over a [`judge_common::CheckerRef`]'s opaque options bag.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct CheckerOptions<'a>(pub &'a BTreeMap<String, String>);

impl<'a> CheckerOptions<'a> {
    pub fn bool_flag(&self, key: &str, default: bool) -> bool {
        match self.0.get(key).map(String::as_str) {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            _ => default,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}
