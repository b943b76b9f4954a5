use domgrab_core::identity::{ClassAttr, ElementIdentity};
use domgrab_core::listener::{
    ElementFacts, InlineHandler, ListenerOutcome, ListenerReport, ListenerNote,
};
use domgrab_core::protocol::{BusRequest, BusResponse};
use serde_json::json;

#[test]
fn requests_serialize_with_camel_case_action_names() {
    let toggle = serde_json::to_value(&BusRequest::ToggleSelectionMode).unwrap();
    assert_eq!(toggle, json!({ "action": "toggleSelectionMode" }));

    let made = serde_json::to_value(&BusRequest::SelectionMade {
        new_picker_state: false,
    })
    .unwrap();
    assert_eq!(
        made,
        json!({ "action": "selectionMade", "newPickerState": false })
    );

    let check = serde_json::to_value(&BusRequest::CheckDevToolsConnection).unwrap();
    assert_eq!(check, json!({ "action": "checkDevToolsConnection" }));
}

#[test]
fn fetch_request_round_trips() {
    let request = BusRequest::FetchEventListeners {
        request_id: 7,
        target_element_info: ElementIdentity::new("button", "go", "primary"),
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["action"], "fetchEventListeners");
    assert_eq!(value["requestId"], 7);
    assert_eq!(value["targetElementInfo"]["tagName"], "button");

    let back: BusRequest = serde_json::from_value(value).unwrap();
    assert_eq!(back, request);
}

#[test]
fn result_push_round_trips() {
    let push = BusRequest::EventListenersResult {
        request_id: 3,
        selector: "document.getElementById('go')".to_string(),
        fallback_selectors: vec!["document.getElementById('go')".to_string()],
        listeners: ListenerOutcome::note("pending"),
        timestamp: 1234,
    };
    let value = serde_json::to_value(&push).unwrap();
    assert_eq!(value["action"], "eventListenersResult");
    assert_eq!(value["fallbackSelectors"][0], "document.getElementById('go')");

    let back: BusRequest = serde_json::from_value(value).unwrap();
    assert_eq!(back, push);
}

#[test]
fn class_attribute_accepts_both_html_and_svg_shapes() {
    let html: ElementIdentity =
        serde_json::from_value(json!({ "tagName": "div", "id": "", "classes": "a b" })).unwrap();
    assert_eq!(html.classes.raw(), "a b");

    let svg: ElementIdentity = serde_json::from_value(json!({
        "tagName": "circle",
        "id": "",
        "classes": { "baseVal": "dot" }
    }))
    .unwrap();
    assert_eq!(svg.classes, ClassAttr::Svg { base_val: "dot".to_string() });
    assert_eq!(svg.classes.names(), vec!["dot".to_string()]);
}

#[test]
fn listener_outcome_shapes_are_distinguished_untagged() {
    let notes: ListenerOutcome =
        serde_json::from_value(json!([{ "note": "please wait" }])).unwrap();
    assert_eq!(
        notes,
        ListenerOutcome::Notes(vec![ListenerNote::new("please wait")])
    );

    let failure: ListenerOutcome =
        serde_json::from_value(json!({ "error": "Element not found" })).unwrap();
    assert!(matches!(failure, ListenerOutcome::Failure(_)));

    let report: ListenerOutcome = serde_json::from_value(json!({
        "tagName": "BUTTON",
        "id": "go",
        "classes": "primary",
        "inlineEvents": { "click": { "handlerBody": "go()", "isInline": true } },
        "timestamp": 99
    }))
    .unwrap();
    let ListenerOutcome::Report(report) = report else {
        panic!("expected report");
    };
    assert_eq!(report.tag_name, "BUTTON");
    assert_eq!(report.inline_events["click"], InlineHandler::new("go()"));
}

#[test]
fn report_serialization_skips_absent_fields() {
    let facts = ElementFacts {
        tag_name: "DIV".to_string(),
        ..ElementFacts::default()
    };
    let report = ListenerReport::from_facts(facts, 5);
    let value = serde_json::to_value(&report).unwrap();

    let object = value.as_object().unwrap();
    assert!(!object.contains_key("listeners"));
    assert!(!object.contains_key("note"));
    assert!(!object.contains_key("usedFallback"));
    assert!(!object.contains_key("fallbackSelector"));
}

#[test]
fn placeholder_carries_the_wait_note() {
    let ListenerOutcome::Notes(notes) = ListenerOutcome::placeholder() else {
        panic!("expected notes");
    };
    assert_eq!(notes[0].note, "Getting listeners, please wait...");
}

#[test]
fn untagged_responses_keep_their_shape() {
    let toggle = serde_json::to_value(&BusResponse::Toggle {
        status: "selectionModeToggled".to_string(),
        is_active: true,
    })
    .unwrap();
    assert_eq!(
        toggle,
        json!({ "status": "selectionModeToggled", "isActive": true })
    );

    let connection: BusResponse =
        serde_json::from_value(json!({ "connected": true, "timestamp": 10 })).unwrap();
    assert_eq!(
        connection,
        BusResponse::Connection {
            connected: true,
            timestamp: 10
        }
    );

    let error = BusResponse::unhandled("mystery");
    assert_eq!(
        serde_json::to_value(&error).unwrap(),
        json!({ "error": "Unhandled message action: mystery" })
    );
}
