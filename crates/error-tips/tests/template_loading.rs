use error_tips::{
    ExtractError, FetchError, MemoryTemplateSource, MergeStats, Template, TemplateExtractor,
    TemplateLoadError, TemplateRegistry, TemplateSetLoader, TemplateSource,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// One template per line: `type-id|body`. A line reading `!` makes the whole set unparseable.
struct LineExtractor;

impl TemplateExtractor for LineExtractor {
    fn extract(&self, set_name: &str, markup: &str) -> Result<Vec<Template>, ExtractError> {
        let mut templates = Vec::new();
        for line in markup.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line == "!" {
                return Err(ExtractError::Unparseable {
                    set: set_name.to_string(),
                });
            }
            if let Some((type_id, body)) = line.split_once('|') {
                templates.push(Template::new(type_id, body).with_origin(set_name));
            }
        }
        Ok(templates)
    }
}

/// Delays one path, serves everything else from memory.
struct SlowSource {
    inner: MemoryTemplateSource,
    slow_path: String,
    delay: Duration,
}

impl TemplateSource for SlowSource {
    fn fetch(&self, path: &str) -> Result<String, FetchError> {
        if path == self.slow_path {
            thread::sleep(self.delay);
        }
        self.inner.fetch(path)
    }
}

/// Every fetch blocks until as many fetches as the barrier expects are running.
struct RendezvousSource {
    inner: MemoryTemplateSource,
    barrier: Barrier,
}

impl TemplateSource for RendezvousSource {
    fn fetch(&self, path: &str) -> Result<String, FetchError> {
        self.barrier.wait();
        self.inner.fetch(path)
    }
}

fn loader(source: MemoryTemplateSource) -> TemplateSetLoader {
    TemplateSetLoader::new(Arc::new(source), Arc::new(LineExtractor))
}

fn two_sets() -> MemoryTemplateSource {
    MemoryTemplateSource::new()
        .with_resource(
            "tips/errors.base.html",
            "UNCLOSED_TAG|Tag {{openTag.name}} is never closed\nINVALID_ATTR_NAME|Bad attribute",
        )
        .with_resource(
            "tips/errors.forbidden-js.html",
            "SCRIPT_ELEMENT_NOT_ALLOWED|No scripts\nEVENT_HANDLER_ATTR_NOT_ALLOWED|No handlers",
        )
}

#[test]
fn test_disjoint_sets_resolve_one_template_each() {
    let registry = TemplateRegistry::new();
    let summary = registry
        .load_template_sets(&loader(two_sets()), "tips/", &["base", "forbidden-js"])
        .unwrap();

    assert_eq!(summary.sets, 2);
    assert_eq!(
        summary.merged,
        MergeStats {
            added: 4,
            replaced: 0,
            rejected: 0
        }
    );

    for type_id in [
        "UNCLOSED_TAG",
        "INVALID_ATTR_NAME",
        "SCRIPT_ELEMENT_NOT_ALLOWED",
        "EVENT_HANDLER_ATTR_NOT_ALLOWED",
    ] {
        assert_eq!(registry.templates_matching(type_id).len(), 1, "{type_id}");
    }
    assert_eq!(
        registry.get("SCRIPT_ELEMENT_NOT_ALLOWED").unwrap().origin(),
        Some("forbidden-js")
    );
}

#[test]
fn test_partial_failure_still_merges_loaded_sets() {
    let registry = TemplateRegistry::new();
    let err = registry
        .load_template_sets(&loader(two_sets()), "tips/", &["base", "missing"])
        .unwrap_err();

    assert_eq!(
        err,
        TemplateLoadError {
            failed: 1,
            requested: 2,
            merged: MergeStats {
                added: 2,
                replaced: 0,
                rejected: 0
            },
        }
    );
    assert!(err.to_string().contains("at least one template file did not load"));
    assert!(registry.contains("UNCLOSED_TAG"));
    assert!(registry.contains("INVALID_ATTR_NAME"));
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_unparseable_set_counts_as_failure() {
    let source = two_sets().with_resource("tips/errors.broken.html", "A|a\n!\n");
    let registry = TemplateRegistry::new();
    let err = registry
        .load_template_sets(&loader(source), "tips/", &["broken", "base"])
        .unwrap_err();

    assert_eq!(err.failed, 1);
    assert!(!registry.contains("A"));
    assert!(registry.contains("UNCLOSED_TAG"));
}

#[test]
fn test_repeated_loads_append() {
    let registry = TemplateRegistry::new();
    let loader = loader(two_sets());

    registry
        .load_template_sets(&loader, "tips/", &["base"])
        .unwrap();
    assert_eq!(registry.len(), 2);

    registry
        .load_template_sets(&loader, "tips/", &["forbidden-js"])
        .unwrap();
    assert_eq!(registry.len(), 4);

    let summary = registry
        .load_template_sets(&loader, "tips/", &["base"])
        .unwrap();
    assert_eq!(summary.merged.replaced, 2);
    assert_eq!(registry.len(), 4);
}

#[test]
fn test_empty_name_list_succeeds() {
    let registry = TemplateRegistry::new();
    let names: [&str; 0] = [];
    let summary = registry
        .load_template_sets(&loader(two_sets()), "tips/", &names)
        .unwrap();
    assert_eq!(summary.sets, 0);
    assert!(registry.is_empty());
}

#[test]
fn test_fetch_timeout_fails_only_the_slow_set() {
    let source = SlowSource {
        inner: two_sets(),
        slow_path: "tips/errors.forbidden-js.html".to_string(),
        delay: Duration::from_secs(2),
    };
    let loader = TemplateSetLoader::new(Arc::new(source), Arc::new(LineExtractor))
        .with_fetch_timeout(Some(Duration::from_millis(100)));

    let registry = TemplateRegistry::new();
    let err = registry
        .load_template_sets(&loader, "tips/", &["base", "forbidden-js"])
        .unwrap_err();

    assert_eq!(err.failed, 1);
    assert_eq!(err.requested, 2);
    assert!(registry.contains("UNCLOSED_TAG"));
    assert!(!registry.contains("SCRIPT_ELEMENT_NOT_ALLOWED"));
}

#[test]
fn test_concurrent_loads_share_one_registry() {
    let registry = Arc::new(TemplateRegistry::new());
    let loader = loader(two_sets());

    let handles: Vec<_> = ["base", "forbidden-js"]
        .into_iter()
        .map(|name| {
            let registry = Arc::clone(&registry);
            let loader = loader.clone();
            thread::spawn(move || registry.load_template_sets(&loader, "tips/", &[name]))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(registry.len(), 4);
}

#[test]
fn test_fetches_are_in_flight_together() {
    let source = RendezvousSource {
        inner: two_sets(),
        barrier: Barrier::new(2),
    };
    let loader = TemplateSetLoader::new(Arc::new(source), Arc::new(LineExtractor))
        .with_fetch_timeout(Some(Duration::from_secs(5)));

    let registry = TemplateRegistry::new();
    let summary = registry
        .load_template_sets(&loader, "tips/", &["base", "forbidden-js"])
        .unwrap();
    assert_eq!(summary.sets, 2);
    assert_eq!(registry.len(), 4);
}

#[test]
fn test_slow_sets_load_in_parallel() {
    struct DelayedSource {
        inner: MemoryTemplateSource,
        delay: Duration,
    }

    impl TemplateSource for DelayedSource {
        fn fetch(&self, path: &str) -> Result<String, FetchError> {
            thread::sleep(self.delay);
            self.inner.fetch(path)
        }
    }

    let source = DelayedSource {
        inner: two_sets(),
        delay: Duration::from_millis(300),
    };
    let loader = TemplateSetLoader::new(Arc::new(source), Arc::new(LineExtractor));

    let started = Instant::now();
    TemplateRegistry::new()
        .load_template_sets(&loader, "tips/", &["base", "forbidden-js"])
        .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(550), "took {elapsed:?}");
}
