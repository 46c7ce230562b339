//! Runtime classification and wrapper handlers.

/// Wrapper entry point for Python runtimes.
pub const PYTHON_WRAPPER: &str = "newrelic_lambda_wrapper.handler";

/// Wrapper entry point for Node.js runtimes using CommonJS modules.
pub const NODE_WRAPPER: &str = "newrelic-lambda-wrapper.handler";

/// Wrapper entry point for Node.js runtimes using ECMAScript modules.
pub const NODE_ESM_WRAPPER: &str =
    "/opt/nodejs/node_modules/newrelic-esm-lambda-wrapper/index.handler";

/// Wrapper entry point for Java request handlers.
pub const JAVA_WRAPPER: &str = "com.newrelic.java.HandlerWrapper::handleRequest";

/// Wrapper entry point for Java streaming request handlers.
pub const JAVA_STREAM_WRAPPER: &str = "com.newrelic.java.HandlerWrapper::handleStreamsRequest";

/// Wrapper entry point for Ruby runtimes.
pub const RUBY_WRAPPER: &str = "newrelic_lambda_wrapper.handler";

/// A supported language-runtime family.
///
/// The family determines how a function is instrumented: most families substitute a wrapper
/// handler and remember the original in a marker variable, while .NET hooks in through CoreCLR
/// profiler variables and Go and custom runtimes are covered by the extension alone, so neither
/// touches the handler.
///
/// The set is closed; anything that does not classify is unsupported and must be skipped by
/// callers before attempting any mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RuntimeFamily {
    /// CPython runtimes (`python3.9` and later).
    Python,
    /// Node.js runtimes (`nodejs18.x` and later).
    Node,
    /// JVM runtimes (`java11` and later).
    Java,
    /// .NET runtimes (`dotnet6` and later); instrumented via environment variables only.
    DotNet,
    /// Ruby runtimes (`ruby3.2` and later).
    Ruby,
    /// The legacy Go runtime; extension only.
    Go,
    /// Custom runtimes (`provided.*`); extension only.
    Custom,
}

impl RuntimeFamily {
    /// Classifies a runtime identifier.
    ///
    /// Returns `None` for unknown or malformed identifiers. This is an expected outcome, not a
    /// failure: callers skip such functions.
    pub fn classify(runtime: &str) -> Option<Self> {
        if runtime.starts_with("python") {
            Some(RuntimeFamily::Python)
        } else if runtime.starts_with("nodejs") {
            Some(RuntimeFamily::Node)
        } else if runtime.starts_with("java") {
            Some(RuntimeFamily::Java)
        } else if runtime.starts_with("dotnet") {
            Some(RuntimeFamily::DotNet)
        } else if runtime.starts_with("ruby") {
            Some(RuntimeFamily::Ruby)
        } else if runtime.starts_with("go") {
            Some(RuntimeFamily::Go)
        } else if runtime.starts_with("provided") {
            Some(RuntimeFamily::Custom)
        } else {
            None
        }
    }

    /// Returns `true` if this family installs a wrapper handler.
    pub fn rewrites_handler(self) -> bool {
        matches!(
            self,
            RuntimeFamily::Python | RuntimeFamily::Node | RuntimeFamily::Java | RuntimeFamily::Ruby
        )
    }

    /// Returns the wrapper entry point to install in place of the given handler.
    ///
    /// For Node, `esm` selects the ECMAScript-module wrapper. For Java, the wrapper variant
    /// follows the shape of the handler being replaced: a streaming request handler gets the
    /// streaming wrapper, everything else the plain one. Families that do not rewrite handlers
    /// return `None`.
    pub fn wrapper_handler(self, current_handler: &str, esm: bool) -> Option<&'static str> {
        match self {
            RuntimeFamily::Python => Some(PYTHON_WRAPPER),
            RuntimeFamily::Ruby => Some(RUBY_WRAPPER),
            RuntimeFamily::Node if esm => Some(NODE_ESM_WRAPPER),
            RuntimeFamily::Node => Some(NODE_WRAPPER),
            RuntimeFamily::Java if current_handler.ends_with("::handleStreamsRequest") => {
                Some(JAVA_STREAM_WRAPPER)
            }
            RuntimeFamily::Java => Some(JAVA_WRAPPER),
            RuntimeFamily::DotNet | RuntimeFamily::Go | RuntimeFamily::Custom => None,
        }
    }

    /// Returns `true` if the handler is one of this family's wrapper entry points.
    pub fn is_wrapper(self, handler: &str) -> bool {
        match self {
            RuntimeFamily::Python => handler == PYTHON_WRAPPER,
            RuntimeFamily::Ruby => handler == RUBY_WRAPPER,
            RuntimeFamily::Node => handler == NODE_WRAPPER || handler == NODE_ESM_WRAPPER,
            RuntimeFamily::Java => handler == JAVA_WRAPPER || handler == JAVA_STREAM_WRAPPER,
            RuntimeFamily::DotNet | RuntimeFamily::Go | RuntimeFamily::Custom => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            RuntimeFamily::classify("python3.12"),
            Some(RuntimeFamily::Python)
        );
        assert_eq!(
            RuntimeFamily::classify("nodejs20.x"),
            Some(RuntimeFamily::Node)
        );
        assert_eq!(RuntimeFamily::classify("java21"), Some(RuntimeFamily::Java));
        assert_eq!(
            RuntimeFamily::classify("dotnet8"),
            Some(RuntimeFamily::DotNet)
        );
        assert_eq!(RuntimeFamily::classify("ruby3.3"), Some(RuntimeFamily::Ruby));
        assert_eq!(RuntimeFamily::classify("go1.x"), Some(RuntimeFamily::Go));
        assert_eq!(
            RuntimeFamily::classify("provided.al2023"),
            Some(RuntimeFamily::Custom)
        );
        assert_eq!(RuntimeFamily::classify("not.a.runtime"), None);
        assert_eq!(RuntimeFamily::classify(""), None);
    }

    #[test]
    fn test_wrapper_handler() {
        let python = RuntimeFamily::Python;
        assert_eq!(python.wrapper_handler("app.handler", false), Some(PYTHON_WRAPPER));

        let node = RuntimeFamily::Node;
        assert_eq!(node.wrapper_handler("index.handler", false), Some(NODE_WRAPPER));
        assert_eq!(node.wrapper_handler("index.handler", true), Some(NODE_ESM_WRAPPER));

        let java = RuntimeFamily::Java;
        assert_eq!(
            java.wrapper_handler("com.example.App::handleRequest", false),
            Some(JAVA_WRAPPER)
        );
        assert_eq!(
            java.wrapper_handler("com.example.App::handleStreamsRequest", false),
            Some(JAVA_STREAM_WRAPPER)
        );
        // Re-wrapping an already wrapped streaming handler keeps the variant.
        assert_eq!(
            java.wrapper_handler(JAVA_STREAM_WRAPPER, false),
            Some(JAVA_STREAM_WRAPPER)
        );

        assert_eq!(RuntimeFamily::DotNet.wrapper_handler("any", false), None);
        assert_eq!(RuntimeFamily::Go.wrapper_handler("main", false), None);
    }

    #[test]
    fn test_is_wrapper() {
        assert!(RuntimeFamily::Python.is_wrapper(PYTHON_WRAPPER));
        assert!(!RuntimeFamily::Python.is_wrapper("original_handler"));
        assert!(RuntimeFamily::Java.is_wrapper(JAVA_STREAM_WRAPPER));
        assert!(RuntimeFamily::Node.is_wrapper(NODE_ESM_WRAPPER));
        assert!(!RuntimeFamily::DotNet.is_wrapper(PYTHON_WRAPPER));
    }
}
