// Hand-rolled multipart/form-data assembly shared by the voice-turn and
// ingestion builders. Bodies are built fully in memory; uploads here are
// short voice clips and transcript files, not large media.

pub(crate) fn new_boundary() -> String {
    format!("Boundary-{}", uuid::Uuid::new_v4())
}

pub(crate) fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

pub(crate) fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

pub(crate) fn close(body: &mut Vec<u8>, boundary: &str) {
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
}

pub(crate) fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", boundary)
}
