use std::rc::Rc;

use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

use crate::{VisibilityGate, FEATURED_EVENTS_VIEWED, VISIBILITY_THRESHOLD};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = posthog)]
    fn capture(event: &str);
}

/// Watches the featured events section and captures a one-time view event
/// through the page-global PostHog client. Construct on mount, call
/// [`FeaturedEventsTracker::disconnect`] on unmount.
#[wasm_bindgen]
pub struct FeaturedEventsTracker {
    observer: IntersectionObserver,
    _on_intersect: Closure<dyn FnMut(Array)>,
}

#[wasm_bindgen]
impl FeaturedEventsTracker {
    #[wasm_bindgen(constructor)]
    pub fn new(section: &Element) -> Result<FeaturedEventsTracker, JsValue> {
        let gate = Rc::new(VisibilityGate::new());

        let on_intersect =
            Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
                let Ok(entry) =
                    entries.get(0).dyn_into::<IntersectionObserverEntry>()
                else {
                    return;
                };

                if gate.on_intersection(entry.is_intersecting()) {
                    capture(FEATURED_EVENTS_VIEWED);
                }
            });

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(VISIBILITY_THRESHOLD));

        let observer = IntersectionObserver::new_with_options(
            on_intersect.as_ref().unchecked_ref(),
            &options,
        )?;
        observer.observe(section);

        Ok(FeaturedEventsTracker {
            observer,
            _on_intersect: on_intersect,
        })
    }

    /// Stops observing; nothing fires after this.
    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}
