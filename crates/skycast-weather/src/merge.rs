//! Sun-event annotation of forecast payloads.

use xmltree::{Element, XMLNode};

use crate::types::{SunData, WeatherPayload};

/// Append `<sunrise time=".."/>` and `<sunset time=".."/>` to the payload root.
///
/// Times are copied verbatim; with no sun data the payload is returned untouched.
pub fn annotate_sun_events(mut payload: WeatherPayload, sun: Option<&SunData>) -> WeatherPayload {
    if let Some(sun) = sun {
        let root = payload.root_mut();
        root.children
            .push(XMLNode::Element(time_node("sunrise", &sun.sunrise.time)));
        root.children
            .push(XMLNode::Element(time_node("sunset", &sun.sunset.time)));
    }
    payload
}

fn time_node(name: &str, time: &str) -> Element {
    let mut element = Element::new(name);
    element
        .attributes
        .insert("time".to_string(), time.to_string());
    element
}
