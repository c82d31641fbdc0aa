use super::*;
use crate::backend::SurfaceRequest;
use crate::surface_cache::{CacheConfig, SurfaceCache};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct NullBackend {
    submitted: usize,
}

impl DrawBackend for NullBackend {
    type Surface = u64;
    type Error = String;

    fn render_surface(&mut self, request: &SurfaceRequest) -> Result<Rendered<u64>, String> {
        Ok(Rendered::Ready(request.fingerprint.raw()))
    }

    fn release_surface(&mut self, _surface: u64) {}

    fn submit(&mut self, _batch: &DrawBatch<u64>) -> Result<(), String> {
        self.submitted += 1;
        Ok(())
    }
}

fn adapter() -> RendererAdapter<NullBackend> {
    RendererAdapter::new(
        NullBackend::default(),
        SurfaceCache::shared(CacheConfig::default()),
        1,
        AdapterOptions::default(),
    )
}

#[test]
fn overlapping_damage_merges_into_one_region() {
    let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
    let regions = merge_regions(
        vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(50.0, 50.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 10.0, 10.0),
        ],
        viewport,
    );
    assert_eq!(
        regions,
        vec![
            Rect::new(50.0, 50.0, 10.0, 10.0),
            Rect::new(0.0, 0.0, 15.0, 15.0)
        ]
    );
}

#[test]
fn merging_chains_through_bridging_rects() {
    let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
    let regions = merge_regions(
        vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(20.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 0.0, 20.0, 5.0),
        ],
        viewport,
    );
    assert_eq!(regions, vec![Rect::new(0.0, 0.0, 30.0, 10.0)]);
}

#[test]
fn damage_outside_the_viewport_is_dropped() {
    let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
    let regions = merge_regions(
        vec![
            Rect::new(200.0, 0.0, 10.0, 10.0),
            Rect::new(90.0, 90.0, 20.0, 20.0),
        ],
        viewport,
    );
    assert_eq!(regions, vec![Rect::new(90.0, 90.0, 10.0, 10.0)]);
}

#[test]
fn lifecycle_follows_the_state_machine() {
    let mut adapter = adapter();
    assert_eq!(adapter.lifecycle(), Lifecycle::Uninitialized);
    assert_eq!(
        adapter.start(),
        Err(LifecycleError::InvalidTransition {
            from: Lifecycle::Uninitialized,
            action: "start"
        })
    );
    adapter.mount().unwrap();
    adapter.start().unwrap();
    adapter.pause().unwrap();
    assert_eq!(adapter.pause().unwrap_err().to_string(), "cannot pause a renderer in state Paused");
    adapter.resume().unwrap();
    adapter.unmount().unwrap();
    assert_eq!(adapter.lifecycle(), Lifecycle::Unmounted);
    assert!(adapter.mount().is_err());
}

#[test]
fn patches_are_rejected_unless_mounted_or_running() {
    let mut adapter = adapter();
    assert_eq!(
        adapter.apply_patches(&[]),
        Err(LifecycleError::NotAccepting {
            state: Lifecycle::Uninitialized
        })
    );
    adapter.mount().unwrap();
    assert!(adapter.apply_patches(&[]).unwrap().is_noop());
    adapter.start().unwrap();
    adapter.pause().unwrap();
    assert!(adapter.apply_patches(&[]).is_err());
    assert_eq!(adapter.backend().submitted, 0);
}
