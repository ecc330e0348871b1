use crate::Context;
use http::header;
use http::StatusCode;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

const INDEX_FILE: &str = "index.html";

impl Context {
    /// Responds with the content of the file at `path`.
    ///
    /// A directory serves its `index.html`. A missing file answers `404 page not found`, any other
    /// io error is logged and answered with `500`.
    pub fn serve_file(&mut self, path: impl AsRef<Path>) {
        let mut path = path.as_ref().to_path_buf();
        if path.is_dir() {
            path.push(INDEX_FILE);
        }

        match std::fs::read(&path) {
            Ok(content) => {
                let content_type =
                    path.extension().and_then(|ext| ext.to_str()).map_or(DEFAULT_MIME, mime_for_extension);
                self.set_header(header::CONTENT_TYPE.as_str(), content_type);
                self.write(content);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.set_status(StatusCode::NOT_FOUND);
                self.string(crate::router::DEFAULT_404_BODY);
            }
            Err(e) => {
                warn!(cause = %e, path = %path.display(), "failed to read static file");
                self.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                self.error(e.to_string());
            }
        }
    }
}

/// Resolves a request relative `file` below `root`, refusing anything that could step outside it.
pub(crate) fn resolve(root: &Path, file: &str) -> Option<PathBuf> {
    if file.contains('\0') || file.contains('\\') {
        return None;
    }

    let mut path = root.to_path_buf();
    for component in file.split('/').filter(|component| !component.is_empty() && *component != ".") {
        if component == ".." {
            return None;
        }
        path.push(component);
    }
    Some(path)
}

const DEFAULT_MIME: &str = "application/octet-stream";

fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",

        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",

        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",

        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "zip" => "application/zip",
        "gz" => "application/gzip",

        _ => DEFAULT_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::{mime_for_extension, resolve};
    use crate::Context;
    use bytes::Bytes;
    use http::{Request, StatusCode};
    use std::path::Path;

    fn context() -> Context {
        Context::new(Request::get("/").body(Bytes::new()).unwrap(), None)
    }

    #[test]
    fn serve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.css"), "body {}").unwrap();

        let mut c = context();
        c.serve_file(dir.path().join("site.css"));

        assert_eq!(c.status(), StatusCode::OK);
        assert_eq!(c.response_header("content-type"), Some("text/css; charset=utf-8"));
        assert_eq!(c.response_body(), b"body {}");
    }

    #[test]
    fn serve_directory_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();

        let mut c = context();
        c.serve_file(dir.path());

        assert_eq!(c.response_header("content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(c.response_body(), b"<h1>home</h1>");
    }

    #[test]
    fn serve_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let mut c = context();
        c.serve_file(dir.path().join("missing.txt"));

        assert_eq!(c.status(), StatusCode::NOT_FOUND);
        assert_eq!(c.response_body(), b"404 page not found\n");
    }

    #[test]
    fn resolve_rejects_parent_components() {
        let root = Path::new("/srv/public");

        assert_eq!(resolve(root, "css/site.css"), Some(root.join("css").join("site.css")));
        assert_eq!(resolve(root, "./a//b"), Some(root.join("a").join("b")));
        assert_eq!(resolve(root, ""), Some(root.to_path_buf()));
        assert_eq!(resolve(root, "../etc/passwd"), None);
        assert_eq!(resolve(root, "a/../../b"), None);
        assert_eq!(resolve(root, "a\\..\\b"), None);
    }

    #[test]
    fn mime_types() {
        assert_eq!(mime_for_extension("HTML"), "text/html; charset=utf-8");
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("unknown"), "application/octet-stream");
    }
}
