use courier_engine::{
    build_message, escape_html, html_note, plain_note, Mailer, PipelineError, RelayConfig,
    SmtpMailer, DEFAULT_RELAY_PORT,
};
use lettre::message::Mailbox;
use pretty_assertions::assert_eq;

fn full_relay() -> RelayConfig {
    RelayConfig {
        host: Some("smtp.example.com".to_string()),
        port: None,
        username: Some("sender@example.com".to_string()),
        password: Some("secret".to_string()),
        from: None,
    }
}

#[test]
fn relay_defaults_to_submission_port_and_username_sender() {
    let settings = full_relay().validate().expect("valid relay");
    assert_eq!(settings.port, DEFAULT_RELAY_PORT);
    assert!(!settings.implicit_tls());
    assert_eq!(settings.from.email.to_string(), "sender@example.com");
}

#[test]
fn port_465_means_implicit_tls() {
    let relay = RelayConfig {
        port: Some(465),
        ..full_relay()
    };
    assert!(relay.validate().expect("valid relay").implicit_tls());
}

#[test]
fn explicit_sender_wins_over_username() {
    let relay = RelayConfig {
        from: Some("Courier <courier@example.com>".to_string()),
        ..full_relay()
    };
    let settings = relay.validate().expect("valid relay");
    assert_eq!(settings.from.email.to_string(), "courier@example.com");
}

#[test]
fn missing_pieces_are_named() {
    let relay = RelayConfig {
        password: None,
        ..full_relay()
    };
    assert_eq!(
        relay.validate().err(),
        Some(PipelineError::Config("missing SMTP_PASSWORD".to_string()))
    );

    let relay = RelayConfig {
        host: Some("   ".to_string()),
        ..full_relay()
    };
    assert_eq!(
        relay.validate().err(),
        Some(PipelineError::Config("missing SMTP_HOST".to_string()))
    );
}

#[test]
fn debug_output_hides_password() {
    let rendered = format!("{:?}", full_relay());
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("<redacted>"));
}

#[tokio::test]
async fn unconfigured_mailer_fails_before_connecting() {
    let mailer = SmtpMailer::new(RelayConfig::default());
    let err = mailer
        .deliver("reader@kindle.com", b"%PDF-1.7", "post.pdf", "Post")
        .await
        .expect_err("no relay configured");
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn notes_escape_the_title() {
    assert_eq!(escape_html(r#"Fish & <Chips> "n" 'more'"#), "Fish &amp; &lt;Chips&gt; &quot;n&quot; &#039;more&#039;");
    assert_eq!(plain_note("A & B"), "Blog post: A & B");
    assert_eq!(html_note("A & B"), "<p>Blog post: <strong>A &amp; B</strong></p>");
}

#[test]
fn message_carries_subject_and_pdf_attachment() {
    let from: Mailbox = "sender@example.com".parse().unwrap();
    let message = build_message(&from, "reader@kindle.com", b"%PDF-1.7 test", "post-hello-1.pdf", "Hello")
        .expect("message builds");
    let raw = String::from_utf8_lossy(&message.formatted()).to_string();

    assert!(raw.contains("Subject: CONVERT"));
    assert!(raw.contains("To: reader@kindle.com"));
    assert!(raw.contains("application/pdf"));
    assert!(raw.contains("post-hello-1.pdf"));
    assert!(raw.contains("Blog post: Hello"));
}

#[test]
fn invalid_destination_is_a_delivery_error() {
    let from: Mailbox = "sender@example.com".parse().unwrap();
    let err = build_message(&from, "not an address", b"%PDF", "x.pdf", "X").expect_err("bad address");
    assert!(matches!(err, PipelineError::Delivery { .. }));
}

#[test]
fn readiness_reflects_relay_configuration() {
    assert!(SmtpMailer::new(full_relay()).ready().is_ok());
    assert!(matches!(
        SmtpMailer::new(RelayConfig::default()).ready(),
        Err(PipelineError::Config(_))
    ));
}
