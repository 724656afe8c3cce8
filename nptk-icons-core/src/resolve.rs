// SPDX-License-Identifier: LGPL-3.0-only
//! Per-kind resolution plans.
//!
//! Planning runs on the control thread and does no I/O; everything that may
//! block is packed into a [`Job`] for the worker pool.

use std::path::Path;
use std::sync::Arc;

use crate::collaborator::{IconReference, IconResolver, ImageDecoder};
use crate::composite;
use crate::config::IconCacheConfig;
use crate::descriptor::{strip_raster_extension, Annotation, Descriptor};
use crate::error::IconError;
use crate::image::IconImage;
use crate::request::{themed_size, Bound, IconKind};
use crate::unit::UnitState;
use crate::uri::{path_to_uri, uri_scheme};
use crate::worker::Job;

/// Resolver and decoder shared with worker jobs.
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub resolver: Arc<dyn IconResolver>,
    pub decoder: Arc<dyn ImageDecoder>,
}

/// What to do with a freshly dequeued unit.
pub(crate) enum Plan {
    /// Fails without reaching a worker.
    Fail(IconError),
    /// One blocking job; `state` is what the unit is doing meanwhile.
    Blocking { job: Job, state: UnitState },
    /// Needs dependent units before it can be composed.
    Composite {
        annotation: Annotation,
        size: u32,
        reserve: u32,
    },
}

pub(crate) fn plan(
    kind: IconKind,
    identifier: &str,
    max_width: Bound,
    max_height: Bound,
    config: &IconCacheConfig,
    collaborators: &Collaborators,
) -> Plan {
    match kind {
        IconKind::ThemedName => {
            let size = themed_size(max_width, max_height, config.default_icon_size);
            themed(vec![identifier.to_string()], size, collaborators)
        },
        IconKind::FilePath => uri(path_to_uri(Path::new(identifier)), max_width, max_height, collaborators),
        IconKind::Uri => {
            if uri_scheme(identifier).is_none() {
                return Plan::Fail(IconError::MalformedIdentifier {
                    identifier: identifier.to_string(),
                    reason: "not a URI".to_string(),
                });
            }
            uri(identifier.to_string(), max_width, max_height, collaborators)
        },
        IconKind::StructuredDescriptor => match Descriptor::parse(identifier) {
            Err(reason) => Plan::Fail(IconError::MalformedIdentifier {
                identifier: identifier.to_string(),
                reason,
            }),
            Ok(Descriptor::Themed(names)) => {
                let size = themed_size(max_width, max_height, config.default_icon_size);
                themed(names, size, collaborators)
            },
            Ok(Descriptor::Uri(target)) => uri(target, max_width, max_height, collaborators),
            Ok(Descriptor::Path(path)) => uri(path_to_uri(&path), max_width, max_height, collaborators),
            Ok(Descriptor::Annotated(annotation)) => {
                let size = themed_size(max_width, max_height, config.default_icon_size);
                let reserve = if annotation.ribbon_text().is_some() {
                    config.ribbon_height(size)
                } else {
                    0
                };
                Plan::Composite {
                    annotation,
                    size,
                    reserve,
                }
            },
        },
    }
}

fn themed(names: Vec<String>, size: u32, collaborators: &Collaborators) -> Plan {
    let Collaborators { resolver, decoder } = collaborators.clone();
    let job: Job = Box::new(move || {
        let reference = resolve_themed(resolver.as_ref(), &names, size)
            .ok_or_else(|| IconError::ResolutionFailure(names.join(" ")))?;
        log::debug!("Resolved icon '{}' at size {} to {}", names.join(" "), size, reference);
        decoder
            .decode(&reference, Bound::Px(size), Bound::Px(size))
            .map_err(|source| IconError::Decode {
                identifier: reference.to_string(),
                source,
            })
    });
    Plan::Blocking {
        job,
        state: UnitState::ResolvingReference,
    }
}

fn uri(target: String, max_width: Bound, max_height: Bound, collaborators: &Collaborators) -> Plan {
    let decoder = collaborators.decoder.clone();
    let job: Job = Box::new(move || {
        decoder
            .decode(&IconReference::Uri(target.clone()), max_width, max_height)
            .map_err(|source| IconError::Decode {
                identifier: target,
                source,
            })
    });
    Plan::Blocking {
        job,
        state: UnitState::Decoding,
    }
}

/// Try each name in order; a name with a raster extension gets one more try without it.
pub(crate) fn resolve_themed(resolver: &dyn IconResolver, names: &[String], size: u32) -> Option<IconReference> {
    for name in names {
        if let Some(reference) = resolver.lookup(name, size) {
            return Some(reference);
        }
        if let Some(stem) = strip_raster_extension(name) {
            log::debug!("No icon named '{}', retrying as '{}'", name, stem);
            if let Some(reference) = resolver.lookup(stem, size) {
                return Some(reference);
            }
        }
    }
    None
}

/// Job composing an annotated icon from its gathered inputs.
pub(crate) fn composite_job(
    annotation: Annotation,
    base: IconImage,
    emblem: Option<IconImage>,
    size: u32,
    reserve: u32,
) -> Job {
    Box::new(move || Ok(composite::compose(&base, emblem.as_ref(), &annotation, size, reserve)))
}
