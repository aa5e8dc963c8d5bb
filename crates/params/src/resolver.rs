//! Resolve-once parameter binding

use crate::coercion::{coerce, default_value};
use crate::context::BuildContext;
use crate::descriptor::ParameterDescriptor;
use crate::names::normalize_name;
use crate::provider::{RawValue, ValueProviders};
use crate::value::{ParameterValue, ResolvedParameter, ValueSource};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use rivet_core::{ConfigurationError, Error, Result};
use tracing::{debug, warn};

type Resolution = std::result::Result<ResolvedParameter, ConfigurationError>;

struct Slot {
    descriptor: ParameterDescriptor,
    resolved: OnceCell<Resolution>,
}

/// Binds every declared parameter to a value at most once per run.
///
/// Lookup order is command line, environment, value provider, then the type
/// default. The first outcome (value or error) is cached, so a provider is
/// never invoked twice. The cache uses `OnceCell`, which blocks concurrent
/// first readers until the winner has finished.
pub struct ParameterResolver {
    context: BuildContext,
    providers: ValueProviders,
    /// normalised member name -> slot, in declaration order
    slots: IndexMap<String, Slot>,
    /// normalised member and override names -> slot key
    aliases: IndexMap<String, String>,
}

impl ParameterResolver {
    /// Validate descriptors against each other and the provider registry.
    pub fn new(
        context: BuildContext,
        descriptors: impl IntoIterator<Item = ParameterDescriptor>,
        providers: ValueProviders,
    ) -> Result<Self> {
        let mut slots = IndexMap::new();
        let mut aliases: IndexMap<String, String> = IndexMap::new();

        for descriptor in descriptors {
            let key = normalize_name(descriptor.member());

            if let Some(provider) = descriptor.value_provider() {
                if !providers.contains(provider) {
                    return Err(ConfigurationError::UnknownValueProvider {
                        parameter: descriptor.member().to_string(),
                        provider: provider.to_string(),
                    }
                    .into());
                }
            }

            let names = std::iter::once(descriptor.member()).chain(descriptor.override_name());
            for name in names {
                let alias = normalize_name(name);
                match aliases.get(&alias) {
                    Some(owner) if owner != &key => {
                        return Err(ConfigurationError::DuplicateParameter {
                            name: name.to_string(),
                        }
                        .into());
                    }
                    _ => {
                        aliases.insert(alias, key.clone());
                    }
                }
            }

            if slots.contains_key(&key) {
                return Err(ConfigurationError::DuplicateParameter {
                    name: descriptor.member().to_string(),
                }
                .into());
            }
            slots.insert(
                key,
                Slot {
                    descriptor,
                    resolved: OnceCell::new(),
                },
            );
        }

        let resolver = Self {
            context,
            providers,
            slots,
            aliases,
        };
        for spelled in resolver.unknown_arguments() {
            warn!(parameter = %spelled, "ignoring unknown parameter on the command line");
        }
        Ok(resolver)
    }

    /// Resolve a parameter by member or override name
    pub fn resolve(&self, name: &str) -> Result<&ResolvedParameter> {
        let slot = self
            .slot(name)
            .ok_or_else(|| Error::unknown_parameter(name))?;

        match slot.resolved.get_or_init(|| self.compute(&slot.descriptor)) {
            Ok(resolved) => Ok(resolved),
            Err(err) => Err(Error::Configuration(err.clone())),
        }
    }

    /// The resolved value of a parameter
    pub fn value(&self, name: &str) -> Result<&ParameterValue> {
        self.resolve(name).map(|resolved| &resolved.value)
    }

    /// Whether the parameter was explicitly supplied by some source
    pub fn is_supplied(&self, name: &str) -> Result<bool> {
        self.resolve(name).map(ResolvedParameter::is_supplied)
    }

    /// Whether a parameter with this name is declared
    pub fn is_declared(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    /// Check every required parameter, in declaration order.
    ///
    /// A default value never satisfies a requirement.
    pub fn validate_required(&self) -> Result<()> {
        for slot in self.slots.values() {
            if !slot.descriptor.is_required() {
                continue;
            }
            let resolved = self.resolve(slot.descriptor.member())?;
            if !resolved.is_supplied() {
                return Err(Error::missing_parameter(slot.descriptor.member()));
            }
        }
        Ok(())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.slots.values().map(|slot| &slot.descriptor)
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Command-line names that match no declared parameter, as spelled
    pub fn unknown_arguments(&self) -> Vec<&str> {
        self.context
            .arguments()
            .entries()
            .filter(|entry| {
                let spelled = normalize_name(&entry.spelled);
                !self
                    .slots
                    .values()
                    .any(|slot| normalize_name(slot.descriptor.lookup_name()) == spelled)
            })
            .map(|entry| entry.spelled.as_str())
            .collect()
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.aliases
            .get(&normalize_name(name))
            .and_then(|key| self.slots.get(key))
    }

    fn compute(&self, descriptor: &ParameterDescriptor) -> Resolution {
        let (raw, source) = match self.lookup(descriptor)? {
            Some(found) => found,
            None => {
                let resolved = ResolvedParameter {
                    name: descriptor.member().to_string(),
                    value: default_value(descriptor),
                    source: ValueSource::Default,
                    secret: descriptor.is_secret(),
                };
                debug!(
                    parameter = descriptor.member(),
                    value = %resolved.display_value(),
                    "parameter not supplied, using default"
                );
                return Ok(resolved);
            }
        };

        let value =
            coerce(descriptor, &raw, self.context.working_directory()).map_err(into_configuration)?;
        let resolved = ResolvedParameter {
            name: descriptor.member().to_string(),
            value,
            source,
            secret: descriptor.is_secret(),
        };
        debug!(
            parameter = descriptor.member(),
            source = %resolved.source,
            value = %resolved.display_value(),
            "resolved parameter"
        );
        Ok(resolved)
    }

    fn lookup(
        &self,
        descriptor: &ParameterDescriptor,
    ) -> std::result::Result<Option<(RawValue, ValueSource)>, ConfigurationError> {
        let name = descriptor.lookup_name();
        if let Some(entry) = self.context.arguments().get(name) {
            return Ok(Some((entry.raw(), ValueSource::CommandLine)));
        }

        if let Some(value) = self.context.environment_value(name) {
            return Ok(Some((RawValue::single(value), ValueSource::Environment)));
        }

        let Some(provider_name) = descriptor.value_provider() else {
            return Ok(None);
        };
        let provider = self.providers.get(provider_name).ok_or_else(|| {
            ConfigurationError::UnknownValueProvider {
                parameter: descriptor.member().to_string(),
                provider: provider_name.to_string(),
            }
        })?;

        match provider() {
            Ok(Some(raw)) => Ok(Some((raw, ValueSource::Provider(provider_name.to_string())))),
            Ok(None) => Ok(None),
            Err(message) => Err(ConfigurationError::ValueProviderFailed {
                parameter: descriptor.member().to_string(),
                provider: provider_name.to_string(),
                message,
            }),
        }
    }
}

impl std::fmt::Debug for ParameterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterResolver")
            .field(
                "parameters",
                &self
                    .slots
                    .values()
                    .map(|slot| slot.descriptor.member())
                    .collect::<Vec<_>>(),
            )
            .field("providers", &self.providers)
            .finish()
    }
}

fn into_configuration(err: Error) -> ConfigurationError {
    match err {
        Error::Configuration(inner) => inner,
        other => ConfigurationError::Invalid {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn resolver(
        context: BuildContext,
        descriptors: Vec<ParameterDescriptor>,
        providers: ValueProviders,
    ) -> ParameterResolver {
        ParameterResolver::new(context, descriptors, providers).unwrap()
    }

    #[test]
    fn command_line_wins_over_environment() {
        let ctx = BuildContext::builder()
            .args(["-configuration", "Release"])
            .env_var("CONFIGURATION", "Debug")
            .build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::choice("Configuration", ["Debug", "Release"])],
            ValueProviders::new(),
        );

        let resolved = r.resolve("Configuration").unwrap();
        assert_eq!(resolved.value, ParameterValue::Text("Release".into()));
        assert_eq!(resolved.source, ValueSource::CommandLine);
    }

    #[test]
    fn override_name_replaces_member_on_the_command_line() {
        let ctx = BuildContext::builder()
            .args(["--api-key", "from-override", "-NuGetApiKey", "from-member"])
            .build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::string("NuGetApiKey").named("api-key")],
            ValueProviders::new(),
        );
        assert_eq!(
            r.value("NuGetApiKey").unwrap().as_str(),
            Some("from-override")
        );
        // Code may still ask by either name
        assert_eq!(r.value("api-key").unwrap().as_str(), Some("from-override"));
        assert_eq!(r.unknown_arguments(), vec!["NuGetApiKey"]);
    }

    #[test]
    fn member_name_is_not_bound_once_overridden() {
        let ctx = BuildContext::builder()
            .args(["-NuGetApiKey", "from-member"])
            .env_var("CONFIGURATION", "Debug")
            .build();
        let r = resolver(
            ctx,
            vec![
                ParameterDescriptor::string("Configuration")
                    .nullable()
                    .named("config"),
                ParameterDescriptor::string("NuGetApiKey")
                    .nullable()
                    .named("api-key"),
            ],
            ValueProviders::new(),
        );

        let configuration = r.resolve("Configuration").unwrap();
        assert_eq!(configuration.source, ValueSource::Default);
        assert!(configuration.value.is_null());
        assert_eq!(r.resolve("NuGetApiKey").unwrap().source, ValueSource::Default);
    }

    #[test]
    fn override_name_is_used_for_the_environment() {
        let ctx = BuildContext::builder().env_var("CONFIG", "Release").build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::string("Configuration").named("config")],
            ValueProviders::new(),
        );
        let resolved = r.resolve("Configuration").unwrap();
        assert_eq!(resolved.value, ParameterValue::Text("Release".into()));
        assert_eq!(resolved.source, ValueSource::Environment);
    }

    #[test]
    fn environment_is_used_when_cli_is_silent() {
        let ctx = BuildContext::builder().env_var("RETRIES", "3").build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::integer("Retries")],
            ValueProviders::new(),
        );
        let resolved = r.resolve("retries").unwrap();
        assert_eq!(resolved.value, ParameterValue::Integer(3));
        assert_eq!(resolved.source, ValueSource::Environment);
    }

    #[test]
    fn provider_is_invoked_at_most_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let providers = ValueProviders::new().with("git-tag", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(RawValue::single("v1.2.0")))
        });
        let r = resolver(
            BuildContext::default(),
            vec![ParameterDescriptor::string("Tag").provided_by("git-tag")],
            providers,
        );

        let first = r.resolve("Tag").unwrap().clone();
        let second = r.resolve("Tag").unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.source, ValueSource::Provider("git-tag".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn provider_is_not_invoked_when_cli_supplies_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let providers = ValueProviders::new().with("git-tag", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });
        let ctx = BuildContext::builder().args(["-tag", "v2"]).build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::string("Tag").provided_by("git-tag")],
            providers,
        );

        assert_eq!(r.value("Tag").unwrap().as_str(), Some("v2"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn provider_returning_nothing_falls_back_to_default() {
        let providers = ValueProviders::new().with("none", || Ok(None));
        let r = resolver(
            BuildContext::default(),
            vec![ParameterDescriptor::string("Tag").nullable().provided_by("none")],
            providers,
        );
        let resolved = r.resolve("Tag").unwrap();
        assert!(resolved.value.is_null());
        assert_eq!(resolved.source, ValueSource::Default);
    }

    #[test]
    fn failing_provider_is_cached_configuration_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let providers = ValueProviders::new().with("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("not a git repository".to_string())
        });
        let r = resolver(
            BuildContext::default(),
            vec![ParameterDescriptor::string("Tag").provided_by("broken")],
            providers,
        );

        for _ in 0..2 {
            let err = r.resolve("Tag").unwrap_err();
            assert!(matches!(
                err.as_configuration(),
                Some(ConfigurationError::ValueProviderFailed { .. })
            ));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_provider_is_rejected_at_construction() {
        let err = ParameterResolver::new(
            BuildContext::default(),
            vec![ParameterDescriptor::string("Tag").provided_by("missing")],
            ValueProviders::new(),
        )
        .unwrap_err();
        assert_eq!(
            err.as_configuration(),
            Some(&ConfigurationError::UnknownValueProvider {
                parameter: "Tag".into(),
                provider: "missing".into(),
            })
        );
    }

    #[test]
    fn colliding_names_are_rejected() {
        let err = ParameterResolver::new(
            BuildContext::default(),
            vec![
                ParameterDescriptor::string("ApiKey"),
                ParameterDescriptor::string("Token").named("api_key"),
            ],
            ValueProviders::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err.as_configuration(),
            Some(ConfigurationError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn default_does_not_satisfy_required() {
        let r = resolver(
            BuildContext::default(),
            vec![
                ParameterDescriptor::string("Configuration"),
                ParameterDescriptor::integer("BuildNumber").required(),
            ],
            ValueProviders::new(),
        );

        assert_eq!(r.value("BuildNumber").unwrap(), &ParameterValue::Integer(0));
        let err = r.validate_required().unwrap_err();
        assert_eq!(
            err.as_configuration(),
            Some(&ConfigurationError::MissingParameter {
                name: "BuildNumber".into()
            })
        );
    }

    #[test]
    fn explicit_value_satisfies_required() {
        let ctx = BuildContext::builder().env_var("BUILD_NUMBER", "41").build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::integer("BuildNumber").required()],
            ValueProviders::new(),
        );
        assert!(r.validate_required().is_ok());
    }

    #[test]
    fn malformed_value_is_reported_every_time() {
        let ctx = BuildContext::builder().args(["-retries", "lots"]).build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::integer("Retries")],
            ValueProviders::new(),
        );
        let first = r.resolve("Retries").unwrap_err().to_string();
        let second = r.resolve("Retries").unwrap_err().to_string();
        assert_eq!(first, second);
        assert!(first.contains("'lots'"));
    }

    #[test]
    fn undeclared_names_are_errors_and_unknown_arguments_are_listed() {
        let ctx = BuildContext::builder()
            .args(["-verbosity", "high", "-tag", "v1"])
            .build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::string("Tag")],
            ValueProviders::new(),
        );
        assert_eq!(r.unknown_arguments(), vec!["verbosity"]);
        assert!(r.resolve("Verbosity").is_err());
        assert!(!r.is_declared("Verbosity"));
    }

    #[test]
    fn multi_value_cli_arguments_fill_lists() {
        let ctx = BuildContext::builder()
            .args(["-frameworks", "net6.0", "net8.0,net9.0"])
            .build();
        let r = resolver(
            ctx,
            vec![ParameterDescriptor::string("Frameworks").list()],
            ValueProviders::new(),
        );
        assert_eq!(
            r.value("Frameworks").unwrap().as_strings(),
            vec!["net6.0", "net8.0", "net9.0"]
        );
    }
}
