//! Stub collaborators shared by the cache tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use nptk_icons_core::{
    Bound, DecodeError, IconCache, IconCacheConfig, IconImage, IconReference, IconResolver, ImageDecoder,
    ThemeEvent,
};
use tokio::sync::broadcast;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Resolves names from a fixed table to `/icons/<name>.png`.
pub struct StubResolver {
    names: Vec<String>,
    pub lookups: AtomicUsize,
    events: Option<broadcast::Sender<ThemeEvent>>,
}

impl StubResolver {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            lookups: AtomicUsize::new(0),
            events: None,
        }
    }

    pub fn with_events(mut self, events: broadcast::Sender<ThemeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl IconResolver for StubResolver {
    fn lookup(&self, name: &str, _size: u32) -> Option<IconReference> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.names
            .iter()
            .any(|known| known == name)
            .then(|| IconReference::Path(format!("/icons/{}.png", name).into()))
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<ThemeEvent>> {
        self.events.as_ref().map(|events| events.subscribe())
    }
}

/// Produces a solid image filling the bounds (16 px on unbounded axes).
///
/// References containing "missing" fail like an absent file.
pub struct StubDecoder {
    pub delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubDecoder {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn calls_for(&self, reference: &str) -> usize {
        self.calls.lock().unwrap().get(reference).copied().unwrap_or(0)
    }
}

impl ImageDecoder for StubDecoder {
    fn decode(&self, reference: &IconReference, max_width: Bound, max_height: Bound) -> Result<IconImage, DecodeError> {
        let key = reference.to_string();
        *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if key.contains("missing") {
            return Err(DecodeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file",
            )));
        }
        let width = max_width.px().unwrap_or(16).max(1);
        let height = max_height.px().unwrap_or(16).max(1);
        Ok(IconImage::from_rgba_image(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 100, 50, 255]),
        )))
    }
}

pub struct Fixture {
    pub cache: IconCache,
    pub resolver: Arc<StubResolver>,
    pub decoder: Arc<StubDecoder>,
}

pub fn fixture(resolver: StubResolver, decoder: StubDecoder) -> Fixture {
    fixture_with_config(IconCacheConfig::default(), resolver, decoder)
}

pub fn fixture_with_config(config: IconCacheConfig, resolver: StubResolver, decoder: StubDecoder) -> Fixture {
    init_logging();
    let resolver = Arc::new(resolver);
    let decoder = Arc::new(decoder);
    let cache = IconCache::new(config, resolver.clone(), decoder.clone()).expect("worker pool starts");
    Fixture {
        cache,
        resolver,
        decoder,
    }
}

/// Collects delivered results in delivery order.
#[derive(Clone, Default)]
pub struct Sink {
    results: Rc<RefCell<Vec<(usize, Option<IconImage>)>>>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback recording its result under `tag`.
    pub fn callback(&self, tag: usize) -> impl FnOnce(Option<IconImage>) + 'static {
        let results = self.results.clone();
        move |image| results.borrow_mut().push((tag, image))
    }

    pub fn len(&self) -> usize {
        self.results.borrow().len()
    }

    pub fn tags(&self) -> Vec<usize> {
        self.results.borrow().iter().map(|(tag, _)| *tag).collect()
    }

    pub fn get(&self, tag: usize) -> Option<Option<IconImage>> {
        self.results
            .borrow()
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, image)| image.clone())
    }

    pub fn images(&self) -> Vec<Option<IconImage>> {
        self.results.borrow().iter().map(|(_, image)| image.clone()).collect()
    }
}

pub fn px(value: u32) -> Bound {
    Bound::Px(value)
}
