use faq_widget::{EntryId, FaqWidget};

#[test]
fn json_ld_faq_block_is_not_mistaken_for_entries() -> faq_widget::Result<()> {
    let html = r#"
    <script type="application/ld+json">
      {"@type":"FAQPage","mainEntity":[{"name":"<div class=\"faq-item\">fake</div>"}]}
    </script>
    <section class="faq-section">
      <div class="faq-item">
        <button class="faq-question"><span class="faq-q-text">Real?</span></button>
        <div class="faq-answer"><p>Yes.</p></div>
      </div>
    </section>
    "#;

    let widget = FaqWidget::from_html(html)?;
    assert_eq!(widget.entry_count(), 1);
    Ok(())
}

#[test]
fn comments_and_entities_inside_entries() -> faq_widget::Result<()> {
    let html = r#"
    <section class="faq-section">
      <!-- <div class="faq-item">commented out</div> -->
      <div class="faq-item">
        <button class="faq-question"><span class="faq-q-text">Fish &amp; chips?</span></button>
        <div class="faq-answer"><p>Served&nbsp;daily &#8211; 12&#x3a;00.</p></div>
      </div>
    </section>
    "#;

    let mut widget = FaqWidget::from_html(html)?;
    widget.set_trace_stderr(false);
    assert_eq!(widget.entry_count(), 1);
    assert_eq!(widget.entries()[0].question(), "Fish & chips?");
    assert_eq!(widget.entries()[0].answer(), "Served\u{a0}daily \u{2013} 12:00.");

    let outcome = widget.filter("& CHIPS")?;
    assert_eq!(outcome.visible, 1);
    assert_eq!(
        widget.question_markup(EntryId(0)).as_deref(),
        Some("Fish <mark>&amp; chips</mark>?")
    );
    Ok(())
}

#[test]
fn unclosed_answer_paragraph_is_closed_by_next_block() -> faq_widget::Result<()> {
    let html = r#"
    <section class="faq-section">
      <div class="faq-item">
        <button class="faq-question"><span class="faq-q-text">Open paragraph?</span></button>
        <div class="faq-answer"><p>First line
          <div class="note">Side note</div>
        </div>
      </div>
    </section>
    "#;

    let mut widget = FaqWidget::from_html(html)?;
    widget.set_trace_stderr(false);
    assert!(widget.entries()[0].answer().starts_with("First line"));
    assert!(!widget.entries()[0].answer().contains("Side note"));

    // The note is outside the answer text, so it never makes the entry match.
    assert_eq!(widget.filter("side note")?.visible, 0);
    Ok(())
}

#[test]
fn uppercase_markup_and_unquoted_attributes() -> faq_widget::Result<()> {
    let html = r#"
    <SECTION CLASS=faq-section>
      <DIV CLASS="faq-item">
        <BUTTON CLASS=faq-question><SPAN CLASS=faq-q-text>Loud?</SPAN><SPAN CLASS=faq-icon></SPAN></BUTTON>
        <DIV CLASS=faq-answer><P>Quiet answer.</P></DIV>
      </DIV>
    </SECTION>
    "#;

    let mut widget = FaqWidget::from_html(html)?;
    widget.set_trace_stderr(false);
    widget.click(".faq-question")?;
    assert!(widget.is_open(EntryId(0)));
    widget.assert_text(".faq-icon", "▴")?;
    widget.assert_attr(".faq-answer", "id", Some("faq-answer-1"))?;
    Ok(())
}
