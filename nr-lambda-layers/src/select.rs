//! Layer candidate filtering and ambiguity resolution.

use nr_lambda_aws::{Architecture, FunctionConfig, LayerCandidate};

use crate::{LayerError, RuntimeFamily};

/// AWS account that publishes the instrumentation layers.
pub const LAYER_PUBLISHER: &str = "451483290750";

/// Name of the language-agnostic extension layer.
pub const EXTENSION_LAYER: &str = "NewRelicLambdaExtension";

/// Returns the ARN prefix shared by all instrumentation layers in a region.
///
/// Presence of this prefix in a function's layer list is the installed-state marker; any layer
/// ARN not carrying it is user-owned and never touched.
pub fn layer_arn_prefix(region: &str) -> String {
    format!("arn:aws:lambda:{region}:{LAYER_PUBLISHER}:layer")
}

/// Returns `true` if the function already has an instrumentation layer attached.
pub fn is_instrumented(config: &FunctionConfig, region: &str) -> bool {
    let prefix = layer_arn_prefix(region);
    config.layers.iter().any(|arn| arn.starts_with(&prefix))
}

/// An injected capability for interactive disambiguation.
///
/// The engine never talks to a terminal directly. When a selection is ambiguous it presents the
/// options through this trait; implementations return `None` when no interactive channel is
/// available, which the selector turns into [`LayerError::AmbiguousSelection`].
pub trait Prompt {
    /// Presents an indexed list of options and returns the chosen index.
    fn choose(&self, message: &str, options: &[String]) -> Option<usize>;
}

/// A prompt stand-in for non-interactive contexts; never chooses.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn choose(&self, _message: &str, _options: &[String]) -> Option<usize> {
        None
    }
}

/// Returns the language-agent layer name expected for a runtime, without architecture suffix.
///
/// Go and custom runtimes have no language agent; they are covered by the extension layer alone.
fn agent_layer_name(runtime: &str) -> Option<String> {
    let (token, prefix) = match RuntimeFamily::classify(runtime)? {
        RuntimeFamily::Python => ("Python", "python"),
        RuntimeFamily::Node => ("NodeJS", "nodejs"),
        RuntimeFamily::Java => ("Java", "java"),
        RuntimeFamily::DotNet => ("Dotnet", "dotnet"),
        RuntimeFamily::Ruby => ("Ruby", "ruby"),
        RuntimeFamily::Go | RuntimeFamily::Custom => return None,
    };

    let version: String = runtime[prefix.len()..]
        .chars()
        .filter(|c| *c != '.')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    Some(format!("NewRelic{token}{version}"))
}

/// Extracts the layer name from a layer version ARN.
///
/// ARNs look like `arn:aws:lambda:{region}:{account}:layer:{name}:{version}`.
fn layer_name(arn: &str) -> Option<&str> {
    arn.split(':').nth(6)
}

/// Returns `true` if the named layer is the given base layer built for the architecture.
///
/// ARM builds are published under the base name with an `ARM64` suffix.
fn name_matches(name: &str, base: &str, architecture: Architecture) -> bool {
    match architecture {
        Architecture::X86 => name == base,
        Architecture::Arm64 => {
            name.strip_suffix("ARM64")
                .is_some_and(|stripped| stripped == base)
        }
    }
}

/// Selects the instrumentation layer version ARN for a runtime and architecture.
///
/// Candidates are filtered down to those compatible with the runtime family and architecture.
/// When both the language agent and the extension layer match, the language agent wins; the
/// extension is tracked independently through the extension flag and is not a selection result.
/// If several equally valid candidates remain, the choice is delegated to the injected
/// [`Prompt`]; without an interactive channel the selection fails rather than guessing.
pub fn layer_selection(
    candidates: &[LayerCandidate],
    runtime: &str,
    architecture: Architecture,
    prompt: &dyn Prompt,
) -> Result<String, LayerError> {
    let agent_name = agent_layer_name(runtime);

    let compatible: Vec<&str> = candidates
        .iter()
        .map(|candidate| candidate.latest_matching_version.layer_version_arn.as_str())
        .filter(|arn| {
            layer_name(arn).is_some_and(|name| {
                agent_name
                    .as_deref()
                    .is_some_and(|agent| name_matches(name, agent, architecture))
                    || name_matches(name, EXTENSION_LAYER, architecture)
            })
        })
        .collect();

    if compatible.is_empty() {
        return Err(LayerError::NoMatchingLayers {
            runtime: runtime.to_owned(),
            architecture,
        });
    }

    // Prefer the language agent over the extension layer.
    let agents: Vec<&str> = compatible
        .iter()
        .copied()
        .filter(|arn| {
            agent_name.as_deref().is_some_and(|agent| {
                layer_name(arn).is_some_and(|name| name_matches(name, agent, architecture))
            })
        })
        .collect();

    let choices: Vec<String> = match agents.len() {
        1 => return Ok(agents[0].to_owned()),
        0 if compatible.len() == 1 => return Ok(compatible[0].to_owned()),
        0 => compatible.iter().map(|arn| (*arn).to_owned()).collect(),
        _ => agents.iter().map(|arn| (*arn).to_owned()).collect(),
    };

    match prompt.choose("multiple layers match, select one to install", &choices) {
        Some(index) if index < choices.len() => Ok(choices[index].clone()),
        _ => Err(LayerError::AmbiguousSelection {
            candidates: choices,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPrompt(usize);

    impl Prompt for ScriptedPrompt {
        fn choose(&self, _message: &str, options: &[String]) -> Option<usize> {
            assert!(!options.is_empty());
            Some(self.0)
        }
    }

    fn candidate(name: &str, version: u32) -> LayerCandidate {
        LayerCandidate {
            layer_arn: format!("arn:aws:lambda:us-east-1:451483290750:layer:{name}"),
            latest_matching_version: nr_lambda_aws::LayerVersion {
                layer_version_arn: format!(
                    "arn:aws:lambda:us-east-1:451483290750:layer:{name}:{version}"
                ),
            },
        }
    }

    #[test]
    fn test_agent_layer_name() {
        assert_eq!(
            agent_layer_name("python3.12").as_deref(),
            Some("NewRelicPython312")
        );
        assert_eq!(
            agent_layer_name("nodejs20.x").as_deref(),
            Some("NewRelicNodeJS20X")
        );
        assert_eq!(agent_layer_name("java11").as_deref(), Some("NewRelicJava11"));
        assert_eq!(agent_layer_name("ruby3.3").as_deref(), Some("NewRelicRuby33"));
        assert_eq!(agent_layer_name("go1.x"), None);
        assert_eq!(agent_layer_name("provided.al2023"), None);
        assert_eq!(agent_layer_name("not.a.runtime"), None);
    }

    #[test]
    fn test_single_agent_candidate() {
        let candidates = vec![candidate("NewRelicPython312", 12)];
        let selected =
            layer_selection(&candidates, "python3.12", Architecture::X86, &NoPrompt).unwrap();
        assert_eq!(
            selected,
            "arn:aws:lambda:us-east-1:451483290750:layer:NewRelicPython312:12"
        );
    }

    #[test]
    fn test_agent_preferred_over_extension() {
        // A Java runtime matches both the language agent and the extension layer; the agent must
        // win without any prompting.
        let candidates = vec![
            candidate(EXTENSION_LAYER, 34),
            candidate("NewRelicJava11", 9),
        ];
        let selected =
            layer_selection(&candidates, "java11", Architecture::X86, &NoPrompt).unwrap();
        assert_eq!(
            selected,
            "arn:aws:lambda:us-east-1:451483290750:layer:NewRelicJava11:9"
        );
    }

    #[test]
    fn test_extension_only_runtime() {
        let candidates = vec![candidate(EXTENSION_LAYER, 34)];
        let selected =
            layer_selection(&candidates, "provided.al2023", Architecture::X86, &NoPrompt).unwrap();
        assert_eq!(
            selected,
            "arn:aws:lambda:us-east-1:451483290750:layer:NewRelicLambdaExtension:34"
        );
    }

    #[test]
    fn test_architecture_suffix() {
        let candidates = vec![
            candidate("NewRelicPython312", 12),
            candidate("NewRelicPython312ARM64", 7),
        ];

        let selected =
            layer_selection(&candidates, "python3.12", Architecture::Arm64, &NoPrompt).unwrap();
        assert_eq!(
            selected,
            "arn:aws:lambda:us-east-1:451483290750:layer:NewRelicPython312ARM64:7"
        );

        let selected =
            layer_selection(&candidates, "python3.12", Architecture::X86, &NoPrompt).unwrap();
        assert_eq!(
            selected,
            "arn:aws:lambda:us-east-1:451483290750:layer:NewRelicPython312:12"
        );
    }

    #[test]
    fn test_no_matching_layers() {
        let candidates = vec![candidate("NewRelicPython311", 4)];
        let err = layer_selection(&candidates, "python3.12", Architecture::X86, &NoPrompt)
            .unwrap_err();
        assert!(matches!(err, LayerError::NoMatchingLayers { .. }));
    }

    #[test]
    fn test_ambiguous_selection_prompts() {
        let candidates = vec![
            candidate(EXTENSION_LAYER, 34),
            candidate("NewRelicLambdaExtension", 35),
        ];

        let selected = layer_selection(
            &candidates,
            "provided.al2023",
            Architecture::X86,
            &ScriptedPrompt(1),
        )
        .unwrap();
        assert_eq!(
            selected,
            "arn:aws:lambda:us-east-1:451483290750:layer:NewRelicLambdaExtension:35"
        );
    }

    #[test]
    fn test_ambiguous_selection_without_terminal() {
        let candidates = vec![
            candidate(EXTENSION_LAYER, 34),
            candidate("NewRelicLambdaExtension", 35),
        ];

        let err = layer_selection(&candidates, "provided.al2023", Architecture::X86, &NoPrompt)
            .unwrap_err();
        match err {
            LayerError::AmbiguousSelection { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_is_instrumented() {
        let mut config = FunctionConfig {
            arn: "arn:aws:lambda:us-east-1:123456789:function:foo".to_owned(),
            handler: "foo.handler".to_owned(),
            runtime: "python3.12".to_owned(),
            architecture: Architecture::X86,
            role: "arn:aws:iam::123456789:role/FooBar".to_owned(),
            environment: Default::default(),
            layers: vec!["arn:aws:lambda:us-east-1:123456789:layer:UserLayer:1".to_owned()],
        };
        assert!(!is_instrumented(&config, "us-east-1"));

        config
            .layers
            .push("arn:aws:lambda:us-east-1:451483290750:layer:NewRelicPython312:12".to_owned());
        assert!(is_instrumented(&config, "us-east-1"));
    }
}
