//! Delivery URL construction.

use serde_json::{Map, Value};

use crate::options::option_string;

const DEFAULT_HOST: &str = "res.cloudinary.com";

/// Transformation shorthands, ordered by their short key.
const TRANSFORMATION_PARAMS: [(&str, &str); 16] = [
    ("angle", "a"),
    ("background", "b"),
    ("border", "bo"),
    ("crop", "c"),
    ("dpr", "dpr"),
    ("effect", "e"),
    ("fetch_format", "f"),
    ("gravity", "g"),
    ("height", "h"),
    ("opacity", "o"),
    ("quality", "q"),
    ("radius", "r"),
    ("width", "w"),
    ("x", "x"),
    ("y", "y"),
    ("zoom", "z"),
];

#[derive(Debug, Clone)]
pub struct UrlBuilder {
    cloud_name: String,
    cname: Option<String>,
}

impl UrlBuilder {
    pub fn new(cloud_name: impl Into<String>, cname: Option<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            cname,
        }
    }

    /// `{scheme}://{host}/{cloud}/{resource_type}/{type}[/{transformation}][/v{version}]/{public_id}[.{format}]`
    ///
    /// The cname only replaces the host on plain http URLs; https URLs
    /// always use the shared delivery host.
    pub fn build(&self, public_id: &str, options: &Map<String, Value>, secure: bool) -> String {
        let scheme = if secure { "https" } else { "http" };
        let host = match self.cname.as_deref() {
            Some(cname) if !secure => cname.trim_end_matches('/'),
            _ => DEFAULT_HOST,
        };
        let resource_type = string_option(options, "resource_type").unwrap_or_else(|| "image".into());
        let delivery_type = string_option(options, "type").unwrap_or_else(|| "upload".into());

        let mut url = format!(
            "{}://{}/{}/{}/{}",
            scheme, host, self.cloud_name, resource_type, delivery_type
        );

        let transformation = transformation(options);
        if !transformation.is_empty() {
            url.push('/');
            url.push_str(&transformation);
        }
        if let Some(version) = string_option(options, "version") {
            url.push_str("/v");
            url.push_str(version.trim_start_matches('v'));
        }

        url.push('/');
        url.push_str(&encode_public_id(public_id));
        if let Some(format) = string_option(options, "format") {
            url.push('.');
            url.push_str(&format);
        }
        url
    }
}

fn string_option(options: &Map<String, Value>, key: &str) -> Option<String> {
    options
        .get(key)
        .and_then(option_string)
        .filter(|s| !s.is_empty())
}

/// Transformation component from shorthand options plus a raw
/// `transformation` string, comma-joined.
pub fn transformation(options: &Map<String, Value>) -> String {
    let mut parts: Vec<String> = TRANSFORMATION_PARAMS
        .iter()
        .filter_map(|(name, short)| {
            string_option(options, name).map(|value| format!("{}_{}", short, value))
        })
        .collect();
    if let Some(raw) = string_option(options, "transformation") {
        parts.push(raw);
    }
    parts.join(",")
}

/// Percent-encode each segment of a public id, keeping the separators.
pub fn encode_public_id(public_id: &str) -> String {
    public_id
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_secure_and_plain() {
        let builder = UrlBuilder::new("demo", None);
        assert_eq!(
            builder.build("uploads/img.png", &Map::new(), true),
            "https://res.cloudinary.com/demo/image/upload/uploads/img.png"
        );
        assert_eq!(
            builder.build("uploads/img.png", &Map::new(), false),
            "http://res.cloudinary.com/demo/image/upload/uploads/img.png"
        );
    }

    #[test]
    fn test_delivery_options() {
        let builder = UrlBuilder::new("demo", Some("media.example.com/".into()));
        let url = builder.build(
            "clips/intro",
            &opts(json!({
                "resource_type": "video",
                "version": 1312461204,
                "format": "mp4",
                "width": 320,
                "crop": "fill",
                "secure": true,
                "tags": ["ignored"],
            })),
            true,
        );
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/video/upload/c_fill,w_320/v1312461204/clips/intro.mp4"
        );
    }

    #[test]
    fn test_cname_only_on_plain_http() {
        let builder = UrlBuilder::new("demo", Some("media.example.com/".into()));
        assert_eq!(
            builder.build("logo", &Map::new(), false),
            "http://media.example.com/demo/image/upload/logo"
        );
        assert_eq!(
            builder.build("logo", &Map::new(), true),
            "https://res.cloudinary.com/demo/image/upload/logo"
        );
    }

    #[test]
    fn test_transformation_order_and_raw() {
        let t = transformation(&opts(json!({
            "width": 100,
            "height": 50,
            "angle": 90,
            "transformation": "e_sepia",
        })));
        assert_eq!(t, "a_90,h_50,w_100,e_sepia");
        assert_eq!(transformation(&Map::new()), "");
    }

    #[test]
    fn test_encode_public_id() {
        assert_eq!(encode_public_id("my dir/a&b"), "my%20dir/a%26b");
    }
}
