//! The overlay composer.
//!
//! Turns an [`Overlay`] tree into a single [`TreeBox`]: each node resolves
//! its backend, is re-rooted at its workdir, and then has its children
//! composed and stacked on top in declared order.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use layerfs_core_store::{LayeredTree, Path, SubTree, TreeBox};
use layerfs_http::{HttpExecutor, ReqwestExecutor, DEFAULT_TIMEOUT};
use tracing::debug;

use crate::backend::{self, Backend};
use crate::placeholder::{EnvReplacer, Replacer};
use crate::{Error, Overlay};

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds composed trees from overlay descriptions.
///
/// ```no_run
/// use std::time::Duration;
/// use layerfs::{Composer, Overlay};
///
/// let composer = Composer::new().with_timeout(Duration::from_secs(10));
/// let tree = composer.compose(&Overlay::new("https://cdn.example.com/site.zip"))?;
/// # let _ = tree;
/// # Ok::<(), layerfs::Error>(())
/// ```
pub struct Composer {
    replacer: Arc<dyn Replacer>,
    env: Lookup,
    timeout: Duration,
    executor: OnceLock<Arc<dyn HttpExecutor>>,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    /// Expand `{env.*}` placeholders, read S3 settings from the process
    /// environment, and fetch with a 30 second client timeout.
    pub fn new() -> Self {
        Self {
            replacer: Arc::new(EnvReplacer::new()),
            env: Arc::new(|name: &str| std::env::var(name).ok()),
            timeout: DEFAULT_TIMEOUT,
            executor: OnceLock::new(),
        }
    }

    pub fn with_replacer(mut self, replacer: impl Replacer + 'static) -> Self {
        self.replacer = Arc::new(replacer);
        self
    }

    /// Use `executor` for every HTTP and S3 request.
    pub fn with_executor(self, executor: Arc<dyn HttpExecutor>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(executor);
        Self {
            executor: cell,
            ..self
        }
    }

    /// Where S3 settings missing from overlay headers are looked up.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Client timeout for the default executor. Ignored once an executor
    /// has been supplied or created.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn replacer(&self) -> &dyn Replacer {
        self.replacer.as_ref()
    }

    /// Expand placeholders, validate, and compose the whole tree.
    ///
    /// Any failing node aborts composition; the error names that node.
    pub fn compose(&self, overlay: &Overlay) -> Result<TreeBox, Error> {
        let overlay = overlay.resolve_placeholders(self.replacer.as_ref());
        overlay.validate()?;
        debug!(nodes = overlay.node_count(), "composing overlay tree");
        self.compose_node(&overlay)
    }

    fn compose_node(&self, overlay: &Overlay) -> Result<TreeBox, Error> {
        let base = self.open_node(overlay).map_err(|source| Error::Overlay {
            description: overlay.to_string(),
            source: Box::new(source),
        })?;
        if overlay.children.is_empty() {
            return Ok(base);
        }

        let mut layered = LayeredTree::from_shared(base);
        for child in &overlay.children {
            // Child errors already carry the child's description.
            layered.push_shared(self.compose_node(child)?);
        }
        debug!(source = %overlay.source, layers = layered.layer_count(), "layered overlay");
        Ok(Arc::new(layered))
    }

    /// Resolve one node and apply its workdir.
    fn open_node(&self, overlay: &Overlay) -> Result<TreeBox, Error> {
        let target = Backend::parse(&overlay.source)?;
        debug!(source = %overlay.source, backend = target.name(), "resolving overlay");

        let raw = match &target {
            Backend::Local(path) => backend::resolve_local(path, overlay)?,
            Backend::Http(url) => backend::resolve_http(url, overlay, self.executor()?)?,
            Backend::S3(url) => {
                backend::resolve_s3(url, overlay, self.executor()?, self.env.as_ref())?
            }
        };

        let workdir = Path::parse(&overlay.workdir).map_err(layerfs_core_store::Error::from)?;
        if workdir.is_root() {
            return Ok(raw);
        }
        debug!(source = %overlay.source, workdir = %workdir, "re-rooting at workdir");
        Ok(Arc::new(SubTree::mount(raw, workdir)?))
    }

    fn executor(&self) -> Result<Arc<dyn HttpExecutor>, Error> {
        if let Some(executor) = self.executor.get() {
            return Ok(executor.clone());
        }
        let created: Arc<dyn HttpExecutor> = Arc::new(ReqwestExecutor::new(self.timeout)?);
        Ok(self.executor.get_or_init(|| created).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::NoopReplacer;
    use crate::ErrorKind;
    use layerfs_core_store::{path, Tree};
    use layerfs_http::executor::mock::MockExecutor;
    use layerfs_http::HttpResponse;

    fn write(dir: &std::path::Path, rel: &str, content: &str) {
        let full = dir.join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    #[test]
    fn local_directory_with_workdir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dist/index.html", "home");
        write(dir.path(), "src/main.ts", "code");

        let overlay = Overlay::new(dir.path().to_string_lossy()).with_workdir("dist");
        let tree = Composer::new().compose(&overlay).unwrap();

        assert_eq!(tree.read(&path!("index.html")).unwrap().as_ref(), b"home");
        assert!(tree.read(&path!("src/main.ts")).unwrap_err().is_not_found());
    }

    #[test]
    fn missing_workdir_fails_composition() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = Overlay::new(dir.path().to_string_lossy()).with_workdir("nope");

        let err = Composer::new().compose(&overlay).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("initialize overlay source="), "{err}");
    }

    #[test]
    fn children_shadow_base_in_order() {
        let base = tempfile::tempdir().unwrap();
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write(base.path(), "shared.txt", "C");
        write(base.path(), "only-base.txt", "base");
        write(a.path(), "shared.txt", "A");
        write(b.path(), "shared.txt", "B");

        let overlay = Overlay::new(base.path().to_string_lossy())
            .with_child(Overlay::new(a.path().to_string_lossy()))
            .with_child(Overlay::new(b.path().to_string_lossy()));
        let tree = Composer::new().compose(&overlay).unwrap();

        assert_eq!(tree.read(&path!("shared.txt")).unwrap().as_ref(), b"B");
        assert_eq!(tree.read(&path!("only-base.txt")).unwrap().as_ref(), b"base");
    }

    #[test]
    fn nested_children_compose_recursively() {
        let base = tempfile::tempdir().unwrap();
        let child = tempfile::tempdir().unwrap();
        let grandchild = tempfile::tempdir().unwrap();
        write(base.path(), "f", "base");
        write(child.path(), "f", "child");
        write(grandchild.path(), "f", "grandchild");
        write(child.path(), "g", "child-only");

        let overlay = Overlay::new(base.path().to_string_lossy()).with_child(
            Overlay::new(child.path().to_string_lossy())
                .with_child(Overlay::new(grandchild.path().to_string_lossy())),
        );
        let tree = Composer::new().compose(&overlay).unwrap();

        assert_eq!(tree.read(&path!("f")).unwrap().as_ref(), b"grandchild");
        assert_eq!(tree.read(&path!("g")).unwrap().as_ref(), b"child-only");
    }

    #[test]
    fn failing_child_is_named_and_aborts() {
        let base = tempfile::tempdir().unwrap();
        let overlay = Overlay::new(base.path().to_string_lossy())
            .with_child(Overlay::new("/definitely/not/here").with_type("zip"));

        let err = Composer::new().compose(&overlay).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(
            err.to_string()
                .starts_with("initialize overlay source=/definitely/not/here workdir= type=zip:"),
            "{err}"
        );
    }

    #[test]
    fn http_404_is_transport_error() {
        let mock = MockExecutor::new();
        let composer = Composer::new().with_executor(Arc::new(mock.clone()));

        let err = composer
            .compose(&Overlay::new("https://cdn.test/site.zip"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("404 Not Found"), "{err}");
        assert_eq!(mock.recorded_requests().len(), 1);
    }

    #[test]
    fn replacer_is_applied_before_resolution() {
        let mock = MockExecutor::new().with_response(
            "https://cdn.test/site.zip",
            HttpResponse::new(500, "Internal Server Error", ""),
        );
        let composer = Composer::new()
            .with_executor(Arc::new(mock.clone()))
            .with_replacer(|s: &str| s.replace("{host}", "cdn.test"));

        let _ = composer.compose(
            &Overlay::new("https://{host}/site.zip").with_header("X-Host", "{host}"),
        );

        let sent = &mock.recorded_requests()[0];
        assert_eq!(sent.url, "https://cdn.test/site.zip");
        assert_eq!(sent.header_values("x-host").collect::<Vec<_>>(), vec!["cdn.test"]);
    }

    #[test]
    fn bad_scheme_fails_before_any_fetch() {
        let mock = MockExecutor::new();
        let composer = Composer::new()
            .with_executor(Arc::new(mock.clone()))
            .with_replacer(NoopReplacer);

        let overlay = Overlay::new("https://cdn.test/a.zip").with_child(Overlay::new("gopher://x/y"));
        let err = composer.compose(&overlay).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(mock.recorded_requests().is_empty());
    }

    #[test]
    fn s3_settings_prefer_headers_over_env() {
        let mock = MockExecutor::new();
        let composer = Composer::new()
            .with_executor(Arc::new(mock.clone()))
            .with_env(|name| match name {
                "AWS_ENDPOINT_URL" => Some("http://env-endpoint.test".to_string()),
                "AWS_USE_PATH_STYLE" => Some("true".to_string()),
                "AWS_BUCKET_NAME" => Some("env-bucket".to_string()),
                _ => None,
            });

        let overlay = Overlay::new("s3://store.test/site.tar.gz")
            .with_header("AWS_ENDPOINT_URL", "http://header-endpoint.test");
        let _ = composer.compose(&overlay);

        let sent = &mock.recorded_requests()[0];
        assert_eq!(sent.url, "http://header-endpoint.test/env-bucket/site.tar.gz");
        assert_eq!(sent.header_values("authorization").count(), 0);
    }
}
