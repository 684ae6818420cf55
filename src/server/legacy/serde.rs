//! Query-string codecs for the legacy wire format.

pub mod de {
    use serde::de::Unexpected;
    use serde::{Deserialize, Deserializer};

    /// Parse a bracketed comma list (`[0,1,900]`) into integers.
    pub fn int_array_from_string<'de, D>(deserializer: D) -> Result<Vec<u16>, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .trim_matches(|c| c == '[' || c == ']')
            .split(',')
            .map(|field| {
                let field = field.trim();
                field
                    .parse()
                    .map_err(|_| serde::de::Error::invalid_value(Unexpected::Str(field), &"u16"))
            })
            .collect()
    }

    pub fn bool_from_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match String::deserialize(deserializer)?.as_ref() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(serde::de::Error::invalid_value(Unexpected::Str(other), &"'0' or '1'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::web;

    use crate::server::legacy::handlers::change_run_once::RunOnceRequest;

    #[test]
    fn int_array_accepts_bracketed_lists() {
        let query = web::Query::<RunOnceRequest>::from_query("t=[65535]").unwrap();
        assert_eq!(query.times, vec![65535]);

        let query = web::Query::<RunOnceRequest>::from_query("t=[0,1,900]").unwrap();
        assert_eq!(query.times, vec![0, 1, 900]);
    }

    #[test]
    fn int_array_rejects_junk() {
        assert!(web::Query::<RunOnceRequest>::from_query("t=[-1]").is_err());
        assert!(web::Query::<RunOnceRequest>::from_query("t=[x]").is_err());
    }
}
