use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use animal_backend::features::animal::selector::{ACCESSORY_OFFSETS, COLOR_RULES, RANGE_WIDTH};
use animal_backend::features::animal::{
    AnimalService, Category, ColorCategory, DIGEST_LEN, DigestSource, HashDigest, NONE_VALUE,
    RasterOptions, RenderOptions, SeededDigest, select,
};
use animal_backend::startup::load_catalog;

const KITTEN: &str = "paw_3kittenkittenkittenkittenkittenkittenkittenkittenkittenkitte";
const BUNNY: &str = "paw_1bunnybunnybunnybunnybunnybunnybunnybunnybunnybunnybunnybunn";

fn manifest_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources/animal/catalog.toml")
}

/// 固定摘要来源，并记录被调用次数
struct FixedDigest {
    digest: HashDigest,
    calls: AtomicUsize,
}

impl FixedDigest {
    fn new(digest: HashDigest) -> Self {
        Self {
            digest,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DigestSource for FixedDigest {
    fn digest_for(&self, _address: &str) -> HashDigest {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.digest
    }
}

fn sequential_digest() -> HashDigest {
    let mut bytes = [0u8; DIGEST_LEN];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = i as u8;
    }
    HashDigest::from_bytes(bytes)
}

fn service_with(source: Arc<dyn DigestSource>) -> AnimalService {
    let catalog = load_catalog(&manifest_path(), "paw").expect("bundled catalog");
    AnimalService::new(Arc::new(catalog), source, RasterOptions::default())
}

fn ordinary_address(c: char) -> String {
    format!("paw_1{}", c.to_string().repeat(59))
}

fn expected(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn sequential_digest_selects_known_assets_and_colors() {
    let service = service_with(Arc::new(FixedDigest::new(sequential_digest())));
    let entries = service.stats(&[ordinary_address('1')]);
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].stats,
        expected(&[
            ("glasses", "glasses-monocle"),
            ("hat", "hat-crown"),
            ("misc", "misc-flower"),
            ("mouth", "mouth-smile"),
            ("shirt_pants", "shirt_pants-overalls"),
            ("shoes", "shoes-boots"),
            ("tail_accessory", "none"),
            ("color_background", "#dcd5bf"),
            ("color_fur", "#a39b6f"),
            ("color_shirt", "#8b8740"),
            ("color_pants", "#595a36"),
            ("color_accent", "#b1c334"),
        ])
    );
}

#[test]
fn saturated_digest_selects_known_assets_and_colors() {
    let service = service_with(Arc::new(FixedDigest::new(HashDigest::from_bytes(
        [0xff; DIGEST_LEN],
    ))));
    let stats = &service.stats(&[ordinary_address('3')])[0].stats;
    assert_eq!(stats["shoes"], "none");
    assert_eq!(stats["glasses"], "glasses-monocle");
    assert_eq!(stats["color_background"], "#faa2a2");
    assert_eq!(stats["color_accent"], "#ff0000");
}

#[test]
fn selection_is_deterministic() {
    let catalog = load_catalog(&manifest_path(), "paw").expect("bundled catalog");
    let digest = HashDigest::random();
    assert_eq!(select(&catalog, &digest, true), select(&catalog, &digest, true));

    let seeded = SeededDigest::new("determinism").expect("seed");
    let addr = ordinary_address('7');
    assert_eq!(seeded.digest_for(&addr), seeded.digest_for(&addr));
}

#[test]
fn each_byte_range_only_affects_its_own_target() {
    let catalog = load_catalog(&manifest_path(), "paw").expect("bundled catalog");
    let base = sequential_digest();
    let base_set = select(&catalog, &base, true);

    let with_range = |offset: usize, quad: [u8; RANGE_WIDTH]| {
        let mut bytes = *base.as_bytes();
        bytes[offset..offset + RANGE_WIDTH].copy_from_slice(&quad);
        HashDigest::from_bytes(bytes)
    };

    for (target, offset) in ACCESSORY_OFFSETS {
        // 取值 0..=候选数 覆盖该分类的全部结果（含 none）
        let options = catalog.list_category(target).len() as u32 + 1;
        let mut seen = HashSet::new();
        for value in 0..=options {
            let changed = select(&catalog, &with_range(offset, value.to_be_bytes()), true);
            seen.insert(changed.asset(target).map(|a| a.id.clone()));
            for c in Category::ALL.into_iter().filter(|c| *c != target) {
                assert_eq!(
                    changed.asset(c),
                    base_set.asset(c),
                    "{} range changed {}",
                    target.name(),
                    c.name()
                );
            }
            assert_eq!(
                changed.colors(),
                base_set.colors(),
                "{} range changed colors",
                target.name()
            );
        }
        assert!(seen.len() > 1, "{} range has no effect", target.name());
    }

    for rule in COLOR_RULES {
        let low = select(&catalog, &with_range(rule.offset, [0x00; RANGE_WIDTH]), true);
        let high = select(&catalog, &with_range(rule.offset, [0xff; RANGE_WIDTH]), true);
        assert_ne!(
            low.color(rule.category),
            high.color(rule.category),
            "{} range has no effect",
            rule.category.name()
        );
        for changed in [&low, &high] {
            for c in ColorCategory::ALL.into_iter().filter(|c| *c != rule.category) {
                assert_eq!(
                    changed.color(c),
                    base_set.color(c),
                    "{} range changed {}",
                    rule.category.name(),
                    c.name()
                );
            }
            for c in Category::ALL {
                assert_eq!(
                    changed.asset(c),
                    base_set.asset(c),
                    "{} range changed {}",
                    rule.category.name(),
                    c.name()
                );
            }
        }
    }

    // 保留段不影响任何结果
    let mut bytes = *base.as_bytes();
    bytes[28..32].fill(0xaa);
    bytes[52..64].fill(0x55);
    assert_eq!(select(&catalog, &HashDigest::from_bytes(bytes), true), base_set);
}

#[test]
fn background_flag_does_not_change_selection() {
    let catalog = load_catalog(&manifest_path(), "paw").expect("bundled catalog");
    let digest = sequential_digest();
    let with = select(&catalog, &digest, true);
    let without = select(&catalog, &digest, false);
    assert!(with.with_background());
    assert!(!without.with_background());
    assert_eq!(with.colors(), without.colors());
    for c in Category::ALL {
        assert_eq!(with.asset(c), without.asset(c));
    }
}

#[test]
fn vanity_overrides_digest_and_skips_derivation() {
    let source = Arc::new(FixedDigest::new(sequential_digest()));
    let service = service_with(source.clone());

    let a = service
        .render(KITTEN, &sequential_digest(), RenderOptions::default())
        .expect("render");
    let b = service
        .render(KITTEN, &HashDigest::from_bytes([0xff; DIGEST_LEN]), RenderOptions::default())
        .expect("render");
    assert_eq!(a, b);
    assert!(String::from_utf8(a.bytes).expect("utf8").contains(r#"<g id="vanity">"#));

    service
        .render_address(BUNNY, RenderOptions::default())
        .expect("render");
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    service
        .render_address(&ordinary_address('9'), RenderOptions::default())
        .expect("render");
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn stats_keep_order_duplicates_and_report_vanities() {
    let service = service_with(Arc::new(SeededDigest::new("bulk").expect("seed")));
    let plain = ordinary_address('4');
    let input = [plain.as_str(), KITTEN, plain.as_str(), BUNNY];
    let entries = service.stats(&input);

    assert_eq!(entries.len(), 4);
    for (entry, addr) in entries.iter().zip(input) {
        assert_eq!(entry.address, addr);
        assert_eq!(entry.stats.len(), 12);
    }
    assert_eq!(entries[0], entries[2]);

    let kitten = &entries[1].stats;
    for c in Category::ALL {
        assert_eq!(kitten[c.name()], NONE_VALUE);
    }
    assert_eq!(kitten["color_background"], "#1f2a44");

    let bunny = &entries[3].stats;
    assert_eq!(bunny["glasses"], "glasses-shades");
    assert_eq!(bunny["hat"], NONE_VALUE);
    assert_eq!(bunny["tail_accessory"], "tail-bow");
    assert_eq!(bunny["color_accent"], "#e0569b");
}

#[test]
fn empty_batch_yields_empty_report() {
    let service = service_with(Arc::new(SeededDigest::new("bulk").expect("seed")));
    let none: [&str; 0] = [];
    assert!(service.stats(&none).is_empty());
}
