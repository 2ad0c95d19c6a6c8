//! Host page controls
//!
//! The page may carry three `.slide` range inputs, `.txtbox` inputs that
//! echo them and the `#onSquid`, `#onBackground` and `#onMirror` buttons.
//! Their DOM callbacks push raw events into a shared queue which a Bevy
//! system drains into [`SceneCommand`]s before the commands are applied.

use aquarium_core::{ButtonKind, SliderKind};
use aquarium_scene::{AquariumSet, SceneCommand, SceneConfig};
use bevy::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlInputElement};

pub struct DomControlsPlugin;

impl Plugin for DomControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingDomEvents>()
            .add_systems(Startup, bind_controls)
            .add_systems(Update, drain_dom_events.before(AquariumSet::Commands));
    }
}

/// Raw control event from a DOM callback
#[derive(Debug, Clone)]
enum DomEvent {
    Slider { kind: SliderKind, value: String },
    Button(ButtonKind),
}

/// Events from JavaScript callbacks waiting for the next frame
#[derive(Resource, Default)]
struct PendingDomEvents(Arc<Mutex<VecDeque<DomEvent>>>);

fn push(queue: &Arc<Mutex<VecDeque<DomEvent>>>, event: DomEvent) {
    if let Ok(mut events) = queue.lock() {
        events.push_back(event);
    }
}

fn query_inputs(document: &Document, selector: &str) -> Vec<HtmlInputElement> {
    let Ok(nodes) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<HtmlInputElement>().ok())
        .collect()
}

/// Copy a slider value into the matching text box
fn echo(document: &Document, index: usize, value: &str) {
    if let Some(txtbox) = query_inputs(document, ".txtbox").get(index) {
        txtbox.set_value(value);
    }
}

fn bind_controls(pending: Res<PendingDomEvents>, config: Res<SceneConfig>) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        tracing::warn!("No document, host page controls disabled");
        return;
    };

    let slides = query_inputs(&document, ".slide");
    for (index, slide) in slides.iter().enumerate() {
        let Some(kind) = SliderKind::from_index(index) else {
            break;
        };
        if kind == SliderKind::FishCount {
            slide.set_max(&config.fish.max.to_string());
        }

        // Dragging fires `input`, releasing fires `change`
        for event in ["input", "change"] {
            let queue = pending.0.clone();
            let input = slide.clone();
            let document = document.clone();
            let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
                let value = input.value();
                echo(&document, index, &value);
                push(&queue, DomEvent::Slider { kind, value });
            }) as Box<dyn FnMut(_)>);

            if let Err(err) =
                slide.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            {
                tracing::warn!(?err, slider = %kind, "Could not bind slider");
            }
            closure.forget();
        }
    }

    // The page's initial count, or the configured one without a count slider
    let initial = slides
        .first()
        .map(|slide| slide.value())
        .unwrap_or_else(|| config.fish.initial_visible.to_string());
    push(
        &pending.0,
        DomEvent::Slider {
            kind: SliderKind::FishCount,
            value: initial,
        },
    );

    let mut buttons = 0;
    for button in ButtonKind::ALL {
        let Some(element) = document.get_element_by_id(button.element_id()) else {
            continue;
        };
        let queue = pending.0.clone();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            push(&queue, DomEvent::Button(button));
        }) as Box<dyn FnMut(_)>);

        if let Err(err) =
            element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        {
            tracing::warn!(?err, button = button.element_id(), "Could not bind button");
        }
        closure.forget();
        buttons += 1;
    }

    tracing::info!(sliders = slides.len(), buttons, "Host page controls bound");
}

fn drain_dom_events(pending: Res<PendingDomEvents>, mut commands: MessageWriter<SceneCommand>) {
    let Ok(mut events) = pending.0.lock() else {
        return;
    };
    while let Some(event) = events.pop_front() {
        match event {
            DomEvent::Slider { kind, value } => match kind.parse(&value) {
                Some(command) => {
                    commands.write(SceneCommand(command));
                }
                None => {
                    tracing::warn!(slider = %kind, value = %value, "Ignoring non-numeric slider value")
                }
            },
            DomEvent::Button(button) => {
                commands.write(SceneCommand(button.command()));
            }
        }
    }
}
