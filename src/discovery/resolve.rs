//! Usage resolution.
//!
//! Runs once after construction. Effects are planned against an immutable
//! view first and applied afterwards, keeping every mutation in one place.

use std::collections::BTreeSet;

use tracing::debug;

use super::{Discovery, TemplateId, ValueFileId};

/// Layer family a template reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Config,
    Secret,
}

#[derive(Debug)]
enum Effect {
    Overshadow {
        path: String,
        by: ValueFileId,
    },
    Use {
        file: ValueFileId,
        path: String,
        template: TemplateId,
    },
    Missing {
        template: TemplateId,
        path: String,
        installation: String,
    },
}

impl Discovery {
    pub(super) fn populate_value_paths(&mut self) {
        let mut effects = self.plan_overshadowing();
        effects.extend(self.plan_usage());

        let (mut overshadowed, mut used, mut missing) = (0usize, 0usize, 0usize);
        for effect in effects {
            match effect {
                Effect::Overshadow { path, by } => {
                    let config = self.config;
                    if let Some(value) = self.value_files[config.0].paths.get_mut(&path) {
                        overshadowed += usize::from(value.overshadowed_by.insert(by));
                    }
                }
                Effect::Use {
                    file,
                    path,
                    template,
                } => {
                    if let Some(value) = self.value_files[file.0].paths.get_mut(&path) {
                        used += usize::from(value.used_by.insert(template));
                    }
                }
                Effect::Missing {
                    template,
                    path,
                    installation,
                } => {
                    if let Some(value) = self.templates[template.0].values.get_mut(&path) {
                        missing += usize::from(value.missing_in.insert(installation));
                    }
                }
            }
        }

        debug!(
            "Resolved usage: {} overshadowed path(s), {} usage link(s), {} missing reference(s)",
            overshadowed, used, missing
        );
    }

    /// Every path an installation override shares with the base config.
    fn plan_overshadowing(&self) -> Vec<Effect> {
        let config = self.config();
        let mut effects = Vec::new();
        for installation in &self.installations {
            let Some(id) = self.config_patches.get(installation) else {
                continue;
            };
            for path in self.value_file(*id).paths.keys() {
                if config.paths.contains_key(path) {
                    effects.push(Effect::Overshadow {
                        path: path.clone(),
                        by: *id,
                    });
                }
            }
        }
        effects
    }

    /// Link every template reference to the layer that supplies it, for
    /// every (installation, app) pair.
    fn plan_usage(&self) -> Vec<Effect> {
        let mut effects = Vec::new();
        for installation in &self.installations {
            for app in &self.apps {
                let key = (installation.clone(), app.clone());
                let config_sources = [
                    self.template_patches.get(&key),
                    self.app_templates.get(app),
                ];
                let secret_sources = [
                    self.secret_template_patches.get(&key),
                    self.app_secret_templates.get(app),
                ];

                for source in config_sources.into_iter().flatten() {
                    self.plan_source(
                        installation,
                        *source,
                        self.template_patches.get(&key).copied(),
                        Family::Config,
                        &mut effects,
                    );
                }
                for source in secret_sources.into_iter().flatten() {
                    self.plan_source(
                        installation,
                        *source,
                        self.secret_template_patches.get(&key).copied(),
                        Family::Secret,
                        &mut effects,
                    );
                }
            }
        }
        effects
    }

    fn plan_source(
        &self,
        installation: &str,
        source: TemplateId,
        patch: Option<TemplateId>,
        family: Family,
        effects: &mut Vec<Effect>,
    ) {
        // A patch's own references still have to resolve.
        let patch = patch
            .filter(|id| *id != source)
            .map(|id| self.template(id));
        let layers: Vec<ValueFileId> = match family {
            Family::Config => [self.config_patches.get(installation), Some(&self.config)]
                .into_iter()
                .flatten()
                .copied()
                .collect(),
            Family::Secret => self.secrets.get(installation).copied().into_iter().collect(),
        };

        for owner in self.include_closure(source) {
            for path in self.template(owner).values.keys() {
                let supplied_by_patch = patch.is_some_and(|p| p.supplies(path));
                if family == Family::Secret && supplied_by_patch {
                    continue;
                }

                let winner = layers.iter().find_map(|id| {
                    let leaves = self.value_file(*id).resolve(path);
                    (!leaves.is_empty()).then_some((*id, leaves))
                });

                match winner {
                    Some((file, leaves)) => {
                        for leaf in leaves {
                            effects.push(Effect::Use {
                                file,
                                path: leaf,
                                template: source,
                            });
                        }
                    }
                    None if supplied_by_patch => {}
                    None => effects.push(Effect::Missing {
                        template: owner,
                        path: path.clone(),
                        installation: installation.to_string(),
                    }),
                }
            }
        }
    }

    /// A template followed by every include it pulls in, transitively.
    fn include_closure(&self, source: TemplateId) -> Vec<TemplateId> {
        let mut seen = BTreeSet::from([source]);
        let mut order = vec![source];
        let mut next = 0;
        while let Some(current) = order.get(next).copied() {
            next += 1;
            for include in &self.template(current).includes {
                if let Some(id) = self.includes.get(include) {
                    if seen.insert(*id) {
                        order.push(*id);
                    }
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use crate::discovery::Discovery;
    use crate::fs::MemoryFilesystem;
    use crate::template::FunctionRegistry;

    fn base() -> MemoryFilesystem {
        MemoryFilesystem::new()
            .with_file("default/config.yaml", "a: 1\nb: 2\nregistry:\n  domain: d\n  mirror: m\n")
            .with_file(
                "default/apps/foo/configmap-values.yaml.template",
                "a: {{ .a }}\nb: {{ .b }}\nb2: {{ .b }}\n",
            )
            .with_file("installations/gauss/config.yaml.patch", "a: 1\nb: 99\n")
            .with_file("installations/gauss/secret.yaml", "token: t\n")
            .with_file("installations/kvm/config.yaml.patch", "{}\n")
            .with_file("installations/kvm/secret.yaml", "")
    }

    fn discover(fs: &MemoryFilesystem) -> Discovery {
        Discovery::new(fs, &FunctionRegistry::standard()).unwrap()
    }

    fn used_by_files(d: &Discovery, file: &crate::discovery::ValueFile, path: &str) -> Vec<String> {
        file.paths[path]
            .used_by
            .iter()
            .map(|id| d.template(*id).filepath.clone())
            .collect()
    }

    #[test]
    fn overshadowing_is_recorded_on_base_only() {
        let d = discover(&base());
        let gauss = d.config_patch("gauss").unwrap();
        assert_eq!(d.config().paths["a"].overshadowed_by.len(), 1);
        assert_eq!(d.config().paths["b"].overshadowed_by.len(), 1);
        assert!(d.config().paths["registry.domain"].overshadowed_by.is_empty());
        assert!(gauss.paths["a"].overshadowed_by.is_empty());
        let by = *d.config().paths["a"].overshadowed_by.iter().next().unwrap();
        assert_eq!(d.value_file(by).filepath, gauss.filepath);
    }

    #[test]
    fn override_wins_over_base() {
        let d = discover(&base());
        let gauss = d.config_patch("gauss").unwrap();
        let template = "default/apps/foo/configmap-values.yaml.template".to_string();
        assert_eq!(used_by_files(&d, gauss, "b"), vec![template.clone()]);
        // kvm has no override, so the same template consumes the base value.
        assert_eq!(used_by_files(&d, d.config(), "b"), vec![template]);
    }

    #[test]
    fn usage_is_deduplicated_per_template() {
        let d = discover(&base());
        assert_eq!(d.config().paths["b"].used_by.len(), 1);
    }

    #[test]
    fn unresolvable_paths_are_missing_per_installation() {
        let fs = base().with_file(
            "default/apps/bar/configmap-values.yaml.template",
            "x: {{ .nowhere }}\n",
        );
        let d = discover(&fs);
        let bar = d.app_template("bar").unwrap();
        let missing: Vec<&str> = bar.values["nowhere"]
            .missing_in
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(missing, vec!["gauss", "kvm"]);
    }

    #[test]
    fn template_patch_supplying_a_path_is_not_missing() {
        let fs = base()
            .with_file(
                "default/apps/bar/configmap-values.yaml.template",
                "x: {{ .special }}\n",
            )
            .with_file(
                "installations/gauss/apps/bar/configmap-values.yaml.patch",
                "special: here\n",
            );
        let d = discover(&fs);
        let bar = d.app_template("bar").unwrap();
        let missing: Vec<&str> = bar.values["special"]
            .missing_in
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(missing, vec!["kvm"]);
    }

    #[test]
    fn aggregate_reference_marks_all_leaves() {
        let fs = base().with_file(
            "default/apps/bar/configmap-values.yaml.template",
            "registry: {{ toYaml .registry }}\n",
        );
        let d = discover(&fs);
        assert_eq!(d.config().paths["registry.domain"].used_by.len(), 1);
        assert_eq!(d.config().paths["registry.mirror"].used_by.len(), 1);
        assert!(!d.app_template("bar").unwrap().values["registry"].may_be_missing());
    }

    #[test]
    fn secrets_resolve_against_the_installation_secret() {
        let fs = base().with_file(
            "default/apps/foo/secret-values.yaml.template",
            "token: {{ .token }}\n",
        );
        let d = discover(&fs);
        let secret = d.secret("gauss").unwrap();
        assert_eq!(secret.paths["token"].used_by.len(), 1);
        let template = d.app_secret_template("foo").unwrap();
        let missing: Vec<&str> = template.values["token"]
            .missing_in
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(missing, vec!["kvm"]);
    }

    #[test]
    fn secret_patch_supplying_a_path_skips_resolution() {
        let fs = base()
            .with_file(
                "default/apps/foo/secret-values.yaml.template",
                "token: {{ .token }}\n",
            )
            .with_file(
                "installations/gauss/apps/foo/secret-values.yaml.patch",
                "token: inline\n",
            );
        let d = discover(&fs);
        assert!(d.secret("gauss").unwrap().paths["token"].used_by.is_empty());
    }

    #[test]
    fn secret_patch_reading_its_own_key_uses_the_secret() {
        let fs = base().with_file(
            "installations/gauss/apps/foo/secret-values.yaml.patch",
            "token: {{ .token }}\n",
        );
        let d = discover(&fs);
        assert_eq!(
            used_by_files(&d, d.secret("gauss").unwrap(), "token"),
            vec!["installations/gauss/apps/foo/secret-values.yaml.patch".to_string()]
        );
    }

    #[test]
    fn config_patch_reading_its_own_key_can_be_missing() {
        let fs = base()
            .with_file(
                "default/apps/bar/configmap-values.yaml.template",
                "x: {{ .special }}\n",
            )
            .with_file(
                "installations/gauss/apps/bar/configmap-values.yaml.patch",
                "special: {{ .special }}\n",
            );
        let d = discover(&fs);
        let patch = d.template_patch("gauss", "bar").unwrap();
        let missing: Vec<&str> = patch.values["special"]
            .missing_in
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(missing, vec!["gauss"]);

        // The patch only echoes the value back, so the default stays unresolved.
        let bar = d.app_template("bar").unwrap();
        assert_eq!(bar.values["special"].missing_in.len(), 2);
    }

    #[test]
    fn include_references_count_for_the_including_template() {
        let fs = base()
            .with_file(
                "default/apps/bar/configmap-values.yaml.template",
                "{{ include \"common\" . }}\n",
            )
            .with_file("include/common.yaml.template", "domain: {{ .registry.domain }}\nq: {{ .gone }}\n");
        let d = discover(&fs);
        assert_eq!(
            used_by_files(&d, d.config(), "registry.domain"),
            vec!["default/apps/bar/configmap-values.yaml.template".to_string()]
        );
        let include = d.include("include/common.yaml.template").unwrap();
        assert!(include.values["gone"].may_be_missing());
    }

    #[test]
    fn include_cycles_terminate() {
        let fs = base()
            .with_file(
                "default/apps/bar/configmap-values.yaml.template",
                "{{ include \"one\" . }}\n",
            )
            .with_file("include/one.yaml.template", "{{ include \"two\" . }}\n")
            .with_file("include/two.yaml.template", "{{ include \"one\" . }}\nx: {{ .a }}\n");
        let d = discover(&fs);
        assert!(!d.config().paths["a"].used_by.is_empty());
    }

    #[test]
    fn discovery_is_deterministic() {
        let a = discover(&base());
        let b = discover(&base());
        assert_eq!(a.config(), b.config());
        assert_eq!(a.installations(), b.installations());
    }
}
