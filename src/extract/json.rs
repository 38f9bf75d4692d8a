//! URL discovery inside JSON documents of unknown shape

use super::{collect_urls, ExtractError, LinkExtractor};
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::io::{BufReader, Read};

/// Scans every string value and object key of a JSON body for URLs
///
/// The body is walked as a stream of values, so concatenated top-level
/// documents are all scanned, and an empty body yields no links. Numbers,
/// booleans and nulls are skipped. Nesting depth is not limited; the walk
/// grows its stack on the heap instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl LinkExtractor for JsonExtractor {
    fn extract(&self, body: &mut dyn Read) -> Result<Vec<String>, ExtractError> {
        let mut links = Vec::new();
        let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(body));
        deserializer.disable_recursion_limit();

        for document in deserializer.into_iter::<JsonLinks>() {
            links.extend(document?.0);
        }

        Ok(links)
    }
}

/// URLs found in one top-level JSON value
struct JsonLinks(Vec<String>);

impl<'de> de::Deserialize<'de> for JsonLinks {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut links = Vec::new();
        let deserializer = serde_stacker::Deserializer::new(deserializer);
        LinkWalker { links: &mut links }.deserialize(deserializer)?;
        Ok(JsonLinks(links))
    }
}

/// Visits a value of any shape, scanning strings and recursing into containers
struct LinkWalker<'a> {
    links: &'a mut Vec<String>,
}

impl<'de, 'a> DeserializeSeed<'de> for LinkWalker<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'a> Visitor<'de> for LinkWalker<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<(), E> {
        collect_urls(value, self.links);
        Ok(())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<(), E> {
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<(), E> {
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<(), E> {
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<(), E> {
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let links = self.links;
        while seq
            .next_element_seed(LinkWalker { links: &mut *links })?
            .is_some()
        {}
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let links = self.links;
        while map
            .next_key_seed(LinkWalker { links: &mut *links })?
            .is_some()
        {
            map.next_value_seed(LinkWalker { links: &mut *links })?;
        }
        Ok(())
    }
}
