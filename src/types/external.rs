use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct LatestRatesResponse {
    pub disclaimer: Option<String>,
    pub license: Option<String>,
    pub timestamp: Option<i64>,
    pub base: Option<String>,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

/// Body of `currencies.json`: code → display name, kept in document order.
#[derive(Debug, Default, PartialEq)]
pub struct CurrencyNames(pub Vec<(String, String)>);

impl CurrencyNames {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }
}

impl<'de> Deserialize<'de> for CurrencyNames {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NamesVisitor;

        impl<'de> Visitor<'de> for NamesVisitor {
            type Value = CurrencyNames;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping currency codes to names")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out: Vec<(String, String)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((code, name)) = map.next_entry::<String, String>()? {
                    // duplicate keys: last one wins, first position kept
                    match out.iter_mut().find(|entry| entry.0 == code) {
                        Some(slot) => slot.1 = name,
                        None => out.push((code, name)),
                    }
                }
                Ok(CurrencyNames(out))
            }
        }

        deserializer.deserialize_map(NamesVisitor)
    }
}
