//! Structured descriptor requests, including annotated icons.

mod common;

use common::{fixture, px, Sink, StubDecoder, StubResolver};
use nptk_icons_core::{CacheKey, IconCache};

fn run(cache: &IconCache) {
    smol::block_on(cache.run_until_idle());
}

#[test]
fn test_descriptor_tries_names_in_order() {
    let f = fixture(StubResolver::new(&["folder"]), StubDecoder::new());
    let sink = Sink::new();

    f.cache.load_descriptor("application-x-unknown folder", px(32), px(32), sink.callback(0));
    run(&f.cache);

    assert!(sink.get(0).flatten().is_some());
    assert_eq!(f.resolver.lookups(), 2);
    assert_eq!(f.decoder.calls_for("/icons/folder.png"), 1);
}

#[test]
fn test_descriptor_with_uri_and_path() {
    let f = fixture(StubResolver::new(&[]), StubDecoder::new());
    let sink = Sink::new();

    f.cache.load_descriptor("file:///icons/app.png", px(32), px(32), sink.callback(0));
    f.cache.load_descriptor("/icons/other.png", px(32), px(32), sink.callback(1));
    run(&f.cache);

    assert!(sink.get(0).flatten().is_some());
    assert!(sink.get(1).flatten().is_some());
    assert_eq!(f.decoder.calls_for("file:///icons/app.png"), 1);
    assert_eq!(f.decoder.calls_for("file:///icons/other.png"), 1);
    assert_eq!(f.resolver.lookups(), 0);
}

#[test]
fn test_malformed_descriptor_delivers_none() {
    let f = fixture(StubResolver::new(&["folder"]), StubDecoder::new());
    let sink = Sink::new();

    f.cache.load_descriptor("{ base = ", px(32), px(32), sink.callback(0));
    f.cache.load_descriptor("{ base = \"folder\", colour = \"red\" }", px(32), px(32), sink.callback(1));
    run(&f.cache);

    assert_eq!(sink.get(0), Some(None));
    assert_eq!(sink.get(1), Some(None));
    assert_eq!(f.decoder.calls(), 0);
}

#[test]
fn test_annotated_icon_is_composed() {
    let f = fixture(StubResolver::new(&["folder", "emblem-shared"]), StubDecoder::new());
    let sink = Sink::new();
    let descriptor = r##"{ base = "folder", ribbon = "new", category = "emblem-shared", tint = "#3584e4" }"##;

    f.cache.load_descriptor(descriptor, px(32), px(32), sink.callback(0));
    run(&f.cache);

    let image = sink.get(0).flatten().expect("composite delivered");
    assert_eq!((image.width(), image.height()), (32, 32));
    assert_eq!(f.decoder.calls_for("/icons/folder.png"), 1);
    assert_eq!(f.decoder.calls_for("/icons/emblem-shared.png"), 1);

    // Inputs are cached like any request; the composite itself is not.
    assert!(!f.cache.is_cached(&CacheKey::new(descriptor, px(32), px(32))));
    assert_eq!(f.cache.cached_len(), 2);
    assert!(f.cache.is_idle());
}

#[test]
fn test_annotated_icon_without_emblem_image() {
    let f = fixture(StubResolver::new(&["folder"]), StubDecoder::new());
    let sink = Sink::new();

    f.cache.load_descriptor(
        r#"{ base = "folder", category = "emblem-unknown" }"#,
        px(32),
        px(32),
        sink.callback(0),
    );
    run(&f.cache);

    let image = sink.get(0).flatten().expect("composed without emblem");
    assert_eq!((image.width(), image.height()), (32, 32));
}

#[test]
fn test_annotated_icon_fails_with_its_base() {
    let f = fixture(StubResolver::new(&["emblem-shared"]), StubDecoder::new());
    let sink = Sink::new();

    f.cache.load_descriptor(
        r#"{ base = "no-such-base", ribbon = "x", category = "emblem-shared" }"#,
        px(32),
        px(32),
        sink.callback(0),
    );
    run(&f.cache);

    assert_eq!(sink.get(0), Some(None));
    assert_eq!(f.cache.stats().failed, 2);
}

#[test]
fn test_annotated_requests_coalesce_but_recompose_later() {
    let f = fixture(StubResolver::new(&["folder"]), StubDecoder::new());
    let sink = Sink::new();
    let descriptor = r#"{ base = "folder", ribbon = "beta" }"#;

    f.cache.load_descriptor(descriptor, px(32), px(32), sink.callback(0));
    f.cache.load_descriptor(descriptor, px(32), px(32), sink.callback(1));
    run(&f.cache);
    assert_eq!(sink.tags(), vec![0, 1]);

    f.cache.load_descriptor(descriptor, px(32), px(32), sink.callback(2));
    run(&f.cache);
    assert!(sink.get(2).flatten().is_some());
    // The base came from the cache the second time.
    assert_eq!(f.decoder.calls_for("/icons/folder.png"), 1);
    assert_eq!(f.cache.stats().cache_hits, 1);
}
