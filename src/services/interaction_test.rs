use super::*;

fn raw(id: &str, kind: &str, value: Option<&str>) -> InteractionData {
    InteractionData {
        id: id.into(),
        kind: kind.into(),
        value: value.map(str::to_owned),
        element_type: "button".into(),
        element_text: "Go".into(),
        app_context: Some("notepad_app".into()),
    }
}

fn element(id: &str) -> Interaction {
    Interaction::try_from(raw(id, "button_press", None)).unwrap()
}

// =============================================================================
// wire shape
// =============================================================================

#[test]
fn wire_shape_uses_camel_case_and_type_key() {
    let json = r#"{"id":"save","type":"button_press","elementType":"button","elementText":"Save","appContext":null}"#;
    let data: InteractionData = serde_json::from_str(json).unwrap();
    assert_eq!(data.kind, "button_press");
    assert_eq!(data.element_text, "Save");
    assert!(data.app_context.is_none());
    assert!(data.value.is_none());
}

// =============================================================================
// classification
// =============================================================================

#[test]
fn empty_id_is_rejected() {
    assert_eq!(Interaction::try_from(raw("  ", "x", None)).unwrap_err(), InteractionError::MissingId);
}

#[test]
fn generic_click_is_element() {
    assert_eq!(element("save").kind, InteractionKind::Element);
}

#[test]
fn app_open_and_command_bar_are_recognized() {
    assert_eq!(Interaction::try_from(raw("notepad_app", "app_open", None)).unwrap().kind, InteractionKind::AppOpen);
    assert_eq!(
        Interaction::try_from(raw(COMMAND_BAR_ID, "command_bar", Some("open notes")))
            .unwrap()
            .kind,
        InteractionKind::CommandBar { command: "open notes".into() }
    );
}

#[test]
fn logo_fields_are_extracted_with_defaults() {
    let value = r#"{"logo_name_input":"Acme"}"#;
    let interaction = Interaction::try_from(raw(GENERATE_LOGO_ID, "submit", Some(value))).unwrap();
    assert_eq!(
        interaction.kind,
        InteractionKind::GenerateLogo { name: "Acme".into(), description: String::new() }
    );
}

#[test]
fn logo_without_value_is_a_plain_element() {
    let interaction = Interaction::try_from(raw(GENERATE_LOGO_ID, "button_press", None)).unwrap();
    assert_eq!(interaction.kind, InteractionKind::Element);
}

#[test]
fn logo_with_non_object_value_is_rejected() {
    let err = Interaction::try_from(raw(GENERATE_LOGO_ID, "submit", Some("[1,2]"))).unwrap_err();
    assert!(matches!(err, InteractionError::MalformedValue { .. }));
}

#[test]
fn webhook_requires_url() {
    let value = r#"{"webhook_payload_input":"{}"}"#;
    let err = Interaction::try_from(raw(SEND_WEBHOOK_ID, "submit", Some(value))).unwrap_err();
    assert_eq!(err, InteractionError::MissingWebhookUrl);
}

#[test]
fn webhook_rejects_relative_url() {
    let value = r#"{"webhook_url_input":"not a url","webhook_payload_input":"{}"}"#;
    let err = Interaction::try_from(raw(SEND_WEBHOOK_ID, "submit", Some(value))).unwrap_err();
    assert!(matches!(err, InteractionError::InvalidWebhookUrl(_)));
}

#[test]
fn webhook_rejects_malformed_payload() {
    let value = r#"{"webhook_url_input":"https://hooks.example.test/x","webhook_payload_input":"{oops"}"#;
    let err = Interaction::try_from(raw(SEND_WEBHOOK_ID, "submit", Some(value))).unwrap_err();
    assert!(matches!(err, InteractionError::InvalidWebhookPayload(_)));
}

#[test]
fn webhook_missing_payload_is_rejected() {
    let value = r#"{"webhook_url_input":"https://hooks.example.test/x"}"#;
    let err = Interaction::try_from(raw(SEND_WEBHOOK_ID, "submit", Some(value))).unwrap_err();
    assert!(matches!(err, InteractionError::InvalidWebhookPayload(_)));
}

#[test]
fn webhook_valid_payload_is_kept_verbatim() {
    let value = r#"{"webhook_url_input":" https://hooks.example.test/x ","webhook_payload_input":"{\"a\": 1}"}"#;
    let interaction = Interaction::try_from(raw(SEND_WEBHOOK_ID, "submit", Some(value))).unwrap();
    assert_eq!(
        interaction.kind,
        InteractionKind::SendWebhook { url: "https://hooks.example.test/x".into(), payload: r#"{"a": 1}"#.into() }
    );
}

// =============================================================================
// history
// =============================================================================

#[test]
fn statefulness_is_derived_from_length() {
    let mut history = InteractionHistory::new(3);
    assert!(history.statefulness_enabled());
    history.set_max_len(0);
    assert!(!history.statefulness_enabled());
    assert_eq!(history.effective_len(), 1);
}

#[test]
fn history_is_newest_first_and_truncated() {
    let mut history = InteractionHistory::new(3);
    for id in ["a", "b", "c", "d", "e"] {
        let sent = history.record(element(id));
        assert!(sent.len() <= 3);
    }
    let ids: Vec<&str> = history
        .entries()
        .iter()
        .map(|i| i.data.id.as_str())
        .collect();
    assert_eq!(ids, ["e", "d", "c"]);
}

#[test]
fn truncation_law_holds_after_shrinking() {
    let mut history = InteractionHistory::new(5);
    for id in ["a", "b", "c", "d"] {
        history.record(element(id));
    }
    history.set_max_len(2);
    let sent = history.record(element("e"));
    let ids: Vec<&str> = sent.iter().map(|i| i.data.id.as_str()).collect();
    assert_eq!(ids, ["e", "d"]);
}

#[test]
fn disabled_statefulness_yields_only_latest() {
    let mut history = InteractionHistory::new(3);
    history.record(element("a"));
    history.record(element("b"));

    history.set_statefulness(false);
    let sent = history.record(element("x"));
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].data.id, "x");
}

#[test]
fn re_enabling_restores_default_length() {
    let mut history = InteractionHistory::new(4);
    history.set_statefulness(false);
    assert_eq!(history.max_len(), 0);
    history.set_statefulness(true);
    assert_eq!(history.max_len(), 4);
}

#[test]
fn enabling_keeps_a_custom_length() {
    let mut history = InteractionHistory::new(4);
    history.set_max_len(7);
    history.set_statefulness(true);
    assert_eq!(history.max_len(), 7);
}

#[test]
fn zero_default_still_enables_with_one_slot() {
    let mut history = InteractionHistory::new(0);
    assert!(!history.statefulness_enabled());
    history.set_statefulness(true);
    assert_eq!(history.max_len(), 1);
}

#[test]
fn constructors_fill_wire_fields() {
    let open = Interaction::app_open("notepad_app", "Notepad");
    assert_eq!(open.data.kind, "app_open");
    assert_eq!(open.data.element_type, "icon");
    assert_eq!(open.data.app_context.as_deref(), Some("notepad_app"));

    let cmd = Interaction::command_bar("write a poem", None);
    assert_eq!(cmd.data.id, COMMAND_BAR_ID);
    assert_eq!(cmd.data.value.as_deref(), Some("write a poem"));
    assert!(cmd.data.app_context.is_none());
}
