//! Response decoding.
//!
//! A caller declares how it wants a successful body decoded with a
//! [`ResponseType`]; [`decode`] turns the buffered body into the matching
//! [`ResponseBody`] variant.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use bytes::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

use super::transport::TransportResponse;

/// How a successful response body should be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResponseType {
    #[default]
    Json,
    Blob,
    Text,
    ArrayBuffer,
    FormData,
    Bytes,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Json => "json",
            ResponseType::Blob => "blob",
            ResponseType::Text => "text",
            ResponseType::ArrayBuffer => "arrayBuffer",
            ResponseType::FormData => "formData",
            ResponseType::Bytes => "bytes",
        }
    }

    /// Value handed back when a body of this type fails to decode.
    pub fn empty(&self) -> ResponseBody {
        match self {
            ResponseType::Json => ResponseBody::Json(Value::Object(Map::new())),
            ResponseType::Blob => ResponseBody::Blob(Blob::default()),
            ResponseType::Text => ResponseBody::Text(String::new()),
            ResponseType::ArrayBuffer => ResponseBody::ArrayBuffer(Bytes::new()),
            ResponseType::FormData => ResponseBody::FormData(FormData::default()),
            ResponseType::Bytes => ResponseBody::Bytes(Vec::new()),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a response type name. Unknown names fall back to [`ResponseType::Json`].
impl FromStr for ResponseType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        Ok(match normalized.as_str() {
            "blob" => ResponseType::Blob,
            "text" => ResponseType::Text,
            "arraybuffer" => ResponseType::ArrayBuffer,
            "formdata" => ResponseType::FormData,
            "bytes" => ResponseType::Bytes,
            _ => ResponseType::Json,
        })
    }
}

/// Per-call request options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestConfig {
    pub response_type: ResponseType,
}

impl RequestConfig {
    pub fn new(response_type: ResponseType) -> Self {
        Self { response_type }
    }
}

impl From<ResponseType> for RequestConfig {
    fn from(response_type: ResponseType) -> Self {
        Self::new(response_type)
    }
}

/// Opaque binary payload with the MIME type the server announced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    content_type: Option<String>,
    data: Bytes,
}

impl Blob {
    pub fn new(content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            data: data.into(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:` URL embedding the payload, base64 encoded.
    pub fn to_data_url(&self) -> String {
        let mime = self
            .content_type()
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or("application/octet-stream");
        format!(
            "data:{};base64,{}",
            mime,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// One value of a decoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        filename: Option<String>,
        content_type: Option<String>,
        data: Bytes,
    },
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File { .. } => None,
        }
    }
}

/// Ordered multipart or urlencoded form entries. Names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn append(&mut self, name: impl Into<String>, value: FormValue) {
        self.entries.push((name.into(), value));
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Blob(Blob),
    Text(String),
    ArrayBuffer(Bytes),
    FormData(FormData),
    Bytes(Vec<u8>),
}

impl ResponseBody {
    pub fn response_type(&self) -> ResponseType {
        match self {
            ResponseBody::Json(_) => ResponseType::Json,
            ResponseBody::Blob(_) => ResponseType::Blob,
            ResponseBody::Text(_) => ResponseType::Text,
            ResponseBody::ArrayBuffer(_) => ResponseType::ArrayBuffer,
            ResponseBody::FormData(_) => ResponseType::FormData,
            ResponseBody::Bytes(_) => ResponseType::Bytes,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_blob(self) -> Option<Blob> {
        match self {
            ResponseBody::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_form_data(self) -> Option<FormData> {
        match self {
            ResponseBody::FormData(f) => Some(f),
            _ => None,
        }
    }

    /// Raw bytes for the binary variants.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ResponseBody::Blob(b) => Some(b.bytes()),
            ResponseBody::ArrayBuffer(b) => Some(b),
            ResponseBody::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum DecodeError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported form content type: {0:?}")]
    FormContentType(Option<String>),
    #[error("malformed multipart body: {0}")]
    Multipart(&'static str),
}

/// Decode a successful response body as `response_type`.
pub(crate) fn decode(
    response_type: ResponseType,
    response: &TransportResponse,
) -> Result<ResponseBody, DecodeError> {
    let body = &response.body;
    Ok(match response_type {
        ResponseType::Json => ResponseBody::Json(serde_json::from_slice(body)?),
        ResponseType::Blob => ResponseBody::Blob(Blob::new(
            response.content_type().map(str::to_string),
            body.clone(),
        )),
        ResponseType::Text => ResponseBody::Text(response.text()),
        ResponseType::ArrayBuffer => ResponseBody::ArrayBuffer(body.clone()),
        ResponseType::FormData => ResponseBody::FormData(parse_form(response)?),
        ResponseType::Bytes => ResponseBody::Bytes(body.to_vec()),
    })
}

fn parse_form(response: &TransportResponse) -> Result<FormData, DecodeError> {
    let content_type = response.content_type();
    let essence = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    match essence.as_str() {
        "application/x-www-form-urlencoded" => Ok(parse_urlencoded(&response.body)),
        "multipart/form-data" => {
            let boundary = content_type
                .and_then(|ct| header_param(ct, "boundary"))
                .filter(|b| !b.is_empty())
                .ok_or(DecodeError::Multipart("missing boundary"))?;
            parse_multipart(&response.body, &boundary)
        }
        _ => Err(DecodeError::FormContentType(content_type.map(str::to_string))),
    }
}

fn parse_urlencoded(body: &[u8]) -> FormData {
    let mut form = FormData::default();
    for pair in body.split(|b| *b == b'&').filter(|p| !p.is_empty()) {
        let (name, value) = match pair.iter().position(|b| *b == b'=') {
            Some(idx) => (&pair[..idx], &pair[idx + 1..]),
            None => (pair, &[][..]),
        };
        form.append(form_decode(name), FormValue::Text(form_decode(value)));
    }
    form
}

fn form_decode(raw: &[u8]) -> String {
    let spaced: Vec<u8> = raw
        .iter()
        .map(|b| if *b == b'+' { b' ' } else { *b })
        .collect();
    let text = String::from_utf8_lossy(&spaced);
    String::from_utf8_lossy(&urlencoding::decode_binary(text.as_bytes())).into_owned()
}

/// `key=value` parameter of a header value such as `Content-Type` or
/// `Content-Disposition`, unquoted.
fn header_param(value: &str, key: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (k, v) = param.split_once('=')?;
        if k.trim().eq_ignore_ascii_case(key) {
            Some(v.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_multipart(body: &Bytes, boundary: &str) -> Result<FormData, DecodeError> {
    let delimiter = format!("--{}", boundary);
    let next_delimiter = format!("\r\n--{}", boundary);

    let start = find(body, delimiter.as_bytes()).ok_or(DecodeError::Multipart("no boundary"))?;
    let mut cursor = start + delimiter.len();
    let mut form = FormData::default();

    loop {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            return Ok(form);
        }
        if !rest.starts_with(b"\r\n") {
            return Err(DecodeError::Multipart("expected CRLF after boundary"));
        }
        cursor += 2;

        let end = find(&body[cursor..], next_delimiter.as_bytes())
            .ok_or(DecodeError::Multipart("unterminated part"))?;
        let part = body.slice(cursor..cursor + end);
        let (name, value) = parse_part(&part)?;
        form.append(name, value);

        cursor += end + next_delimiter.len();
    }
}

fn parse_part(part: &Bytes) -> Result<(String, FormValue), DecodeError> {
    let split = find(part, b"\r\n\r\n").ok_or(DecodeError::Multipart("missing part headers"))?;
    let head = String::from_utf8_lossy(&part[..split]);
    let data = part.slice(split + 4..);

    let mut disposition = None;
    let mut content_type = None;
    for line in head.split("\r\n") {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.eq_ignore_ascii_case("content-disposition") {
                disposition = Some(value.trim().to_string());
            } else if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.trim().to_string());
            }
        }
    }

    let disposition = disposition.ok_or(DecodeError::Multipart("missing Content-Disposition"))?;
    let name =
        header_param(&disposition, "name").ok_or(DecodeError::Multipart("part without name"))?;

    let value = match header_param(&disposition, "filename") {
        Some(filename) => FormValue::File {
            filename: Some(filename),
            content_type,
            data,
        },
        None if content_type.is_some() => FormValue::File {
            filename: None,
            content_type,
            data,
        },
        None => FormValue::Text(String::from_utf8_lossy(&data).into_owned()),
    };
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: &'static str) -> TransportResponse {
        TransportResponse::new(200, body)
    }

    #[test]
    fn test_response_type_from_str() {
        assert_eq!("json".parse::<ResponseType>().unwrap(), ResponseType::Json);
        assert_eq!("blob".parse::<ResponseType>().unwrap(), ResponseType::Blob);
        assert_eq!("TEXT".parse::<ResponseType>().unwrap(), ResponseType::Text);
        assert_eq!(
            "arrayBuffer".parse::<ResponseType>().unwrap(),
            ResponseType::ArrayBuffer
        );
        assert_eq!(
            "array-buffer".parse::<ResponseType>().unwrap(),
            ResponseType::ArrayBuffer
        );
        assert_eq!(
            "formData".parse::<ResponseType>().unwrap(),
            ResponseType::FormData
        );
        assert_eq!("bytes".parse::<ResponseType>().unwrap(), ResponseType::Bytes);
        assert_eq!("xml".parse::<ResponseType>().unwrap(), ResponseType::Json);
        assert_eq!("".parse::<ResponseType>().unwrap(), ResponseType::Json);
        assert_eq!(RequestConfig::default().response_type, ResponseType::Json);
    }

    #[test]
    fn test_empty_values_match_their_type() {
        for ty in [
            ResponseType::Json,
            ResponseType::Blob,
            ResponseType::Text,
            ResponseType::ArrayBuffer,
            ResponseType::FormData,
            ResponseType::Bytes,
        ] {
            assert_eq!(ty.empty().response_type(), ty);
        }
        assert_eq!(ResponseType::Json.empty(), ResponseBody::Json(json!({})));
    }

    #[test]
    fn test_decode_json() {
        let body = decode(ResponseType::Json, &ok(r#"{"id":"u1"}"#)).unwrap();
        assert_eq!(body, ResponseBody::Json(json!({"id": "u1"})));

        assert!(decode(ResponseType::Json, &ok("not json")).is_err());
        assert!(decode(ResponseType::Json, &ok("")).is_err());
    }

    #[test]
    fn test_decode_binary_variants() {
        let res = ok("\u{1}\u{2}").with_header("Content-Type", "image/png");

        let blob = decode(ResponseType::Blob, &res).unwrap().into_blob().unwrap();
        assert_eq!(blob.content_type(), Some("image/png"));
        assert_eq!(blob.bytes().as_ref(), &[1, 2]);

        let buffer = decode(ResponseType::ArrayBuffer, &res).unwrap();
        assert_eq!(buffer.as_bytes(), Some(&[1u8, 2][..]));

        let raw = decode(ResponseType::Bytes, &res).unwrap();
        assert_eq!(raw, ResponseBody::Bytes(vec![1, 2]));
    }

    #[test]
    fn test_decode_text() {
        let body = decode(ResponseType::Text, &ok("plain words")).unwrap();
        assert_eq!(body.as_text(), Some("plain words"));
    }

    #[test]
    fn test_blob_data_url() {
        let blob = Blob::new(Some("image/jpeg".to_string()), &b"abc"[..]);
        assert_eq!(blob.to_data_url(), "data:image/jpeg;base64,YWJj");

        let untyped = Blob::new(None, &b"abc"[..]);
        assert_eq!(
            untyped.to_data_url(),
            "data:application/octet-stream;base64,YWJj"
        );
    }

    #[test]
    fn test_decode_urlencoded_form() {
        let res = ok("name=Ada+Lovelace&tag=a&tag=b%26c&flag")
            .with_header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8");
        let form = decode(ResponseType::FormData, &res)
            .unwrap()
            .into_form_data()
            .unwrap();

        assert_eq!(form.len(), 4);
        assert_eq!(form.get("name").and_then(FormValue::as_text), Some("Ada Lovelace"));
        let tags: Vec<_> = form.get_all("tag").filter_map(FormValue::as_text).collect();
        assert_eq!(tags, vec!["a", "b&c"]);
        assert_eq!(form.get("flag").and_then(FormValue::as_text), Some(""));
    }

    #[test]
    fn test_decode_multipart_form() {
        let body = "preamble\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\
            \r\n\
            Hello\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            file body\r\n\
            --XyZ--\r\n";
        let res = ok(body).with_header("Content-Type", "multipart/form-data; boundary=\"XyZ\"");
        let form = decode(ResponseType::FormData, &res)
            .unwrap()
            .into_form_data()
            .unwrap();

        assert_eq!(form.len(), 2);
        assert_eq!(form.get("title").and_then(FormValue::as_text), Some("Hello"));
        match form.get("file") {
            Some(FormValue::File {
                filename,
                content_type,
                data,
            }) => {
                assert_eq!(filename.as_deref(), Some("a.txt"));
                assert_eq!(content_type.as_deref(), Some("text/plain"));
                assert_eq!(data.as_ref(), b"file body");
            }
            other => panic!("unexpected form value: {:?}", other),
        }
    }

    #[test]
    fn test_decode_form_failures() {
        // Wrong content type.
        assert!(decode(ResponseType::FormData, &ok("a=1")).is_err());

        // Missing boundary parameter.
        let res = ok("--b\r\n").with_header("Content-Type", "multipart/form-data");
        assert!(decode(ResponseType::FormData, &res).is_err());

        // Unterminated part.
        let res = ok("--b\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\nvalue")
            .with_header("Content-Type", "multipart/form-data; boundary=b");
        assert!(decode(ResponseType::FormData, &res).is_err());
    }
}
