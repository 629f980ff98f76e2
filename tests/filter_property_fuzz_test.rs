use faq_widget::{EntryId, FaqWidget};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError, TestCaseResult};

const FILTER_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/filter_property_fuzz_test.txt";
const DEFAULT_FILTER_PROPTEST_CASES: u32 = 128;

#[derive(Clone, Debug)]
struct FaqText {
    question: String,
    answer: String,
}

#[derive(Clone, Debug)]
enum UiAction {
    TypeText(String),
    Advance(i64),
    ClickQuestion(usize),
    PressEnter(usize),
    Flush,
}

fn filter_proptest_cases() -> u32 {
    std::env::var("FAQ_WIDGET_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_FILTER_PROPTEST_CASES)
}

fn text_strategy(max_len: usize) -> BoxedStrategy<String> {
    vec(
        prop_oneof![
            Just('a'),
            Just('B'),
            Just('c'),
            Just('x'),
            Just('Y'),
            Just(' '),
            Just('?'),
            Just('.'),
            Just('('),
            Just('*'),
            Just('<'),
            Just('&'),
            Just('e'),
            Just('\u{301}'),
            Just('é'),
        ],
        0..=max_len,
    )
    .prop_map(|chars| chars.into_iter().collect())
    .boxed()
}

fn faq_strategy() -> BoxedStrategy<Vec<FaqText>> {
    vec(
        (text_strategy(16), text_strategy(24))
            .prop_map(|(question, answer)| FaqText { question, answer }),
        1..=5,
    )
    .boxed()
}

fn ui_action_strategy() -> BoxedStrategy<UiAction> {
    prop_oneof![
        4 => text_strategy(4).prop_map(UiAction::TypeText),
        3 => (0i64..=200).prop_map(UiAction::Advance),
        2 => (0usize..5).prop_map(UiAction::ClickQuestion),
        1 => (0usize..5).prop_map(UiAction::PressEnter),
        1 => Just(UiAction::Flush),
    ]
    .boxed()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn render_page(faqs: &[FaqText]) -> String {
    let mut html = String::from("<input id=\"faqSearch\"><section class=\"faq-section\">");
    for faq in faqs {
        html.push_str(&format!(
            "<div class=\"faq-item\"><button class=\"faq-question\"><span class=\"faq-q-text\">{}</span><span class=\"faq-icon\"></span></button><div class=\"faq-answer\"><p>{}</p></div></div>",
            escape_text(&faq.question),
            escape_text(&faq.answer)
        ));
    }
    html.push_str("</section>");
    html
}

fn mount(faqs: &[FaqText]) -> Result<FaqWidget, TestCaseError> {
    let mut widget = FaqWidget::from_html(&render_page(faqs))
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    widget.set_trace_stderr(false);
    Ok(widget)
}

fn fail(err: faq_widget::Error) -> TestCaseError {
    TestCaseError::fail(format!("{err:?}"))
}

fn assert_filter_matches_search_text(faqs: &[FaqText], keyword: &str) -> TestCaseResult {
    let mut widget = mount(faqs)?;
    let outcome = widget.filter(keyword).map_err(fail)?;
    let needle = keyword.trim().to_lowercase();

    for (index, faq) in faqs.iter().enumerate() {
        let haystack = format!("{} {}", faq.question, faq.answer).to_lowercase();
        let expected = needle.is_empty() || haystack.contains(&needle);
        prop_assert_eq!(
            widget.is_visible(EntryId(index)),
            expected,
            "entry {} keyword {:?}",
            index,
            keyword
        );
    }
    prop_assert_eq!(outcome.visible, widget.visible_count());
    prop_assert_eq!(widget.is_no_result_shown(), outcome.visible == 0);
    prop_assert_eq!(outcome.highlight_failures, 0);
    Ok(())
}

fn assert_highlight_is_idempotent_and_reversible(faqs: &[FaqText], keyword: &str) -> TestCaseResult {
    let mut widget = mount(faqs)?;
    let pristine = widget.dump_dom(".faq-section").map_err(fail)?;

    widget.filter(keyword).map_err(fail)?;
    let first = widget.dump_dom(".faq-section").map_err(fail)?;
    widget.filter(keyword).map_err(fail)?;
    let second = widget.dump_dom(".faq-section").map_err(fail)?;
    prop_assert_eq!(&first, &second);

    widget.filter("").map_err(fail)?;
    for (index, faq) in faqs.iter().enumerate() {
        prop_assert_eq!(
            widget.question_markup(EntryId(index)),
            Some(escape_text(&faq.question))
        );
        prop_assert_eq!(
            widget.answer_markup(EntryId(index)),
            Some(escape_text(&faq.answer))
        );
    }
    prop_assert_eq!(widget.dump_dom(".faq-section").map_err(fail)?, pristine);
    Ok(())
}

fn run_action(widget: &mut FaqWidget, action: &UiAction) -> faq_widget::Result<()> {
    let button = |index: usize| format!("button[aria-controls=\"faq-answer-{}\"]", index + 1);
    match action {
        UiAction::TypeText(value) => widget.type_text("#faqSearch", value),
        UiAction::Advance(delta) => widget.advance_time(*delta),
        UiAction::ClickQuestion(index) => widget.click(&button(*index)),
        UiAction::PressEnter(index) => widget.press_key(&button(*index), "Enter"),
        UiAction::Flush => widget.flush(),
    }
}

fn assert_action_sequence_keeps_invariants(faqs: &[FaqText], actions: &[UiAction]) -> TestCaseResult {
    let mut widget = mount(faqs)?;

    for (step, action) in actions.iter().enumerate() {
        match run_action(&mut widget, action) {
            Ok(()) => {}
            // Clicking a question beyond the generated list finds nothing.
            Err(faq_widget::Error::SelectorNotFound(_)) => {}
            Err(error) => {
                prop_assert!(
                    false,
                    "action returned error at step {step}: {action:?}, error={error:?}"
                );
            }
        }

        prop_assert!(
            widget.open_entries().len() <= 1,
            "exclusive accordion has several open entries after step {step}: {action:?}"
        );
        prop_assert!(
            widget.pending_timers().len() <= 1,
            "debounce left several searches queued after step {step}: {action:?}"
        );
    }

    widget.flush().map_err(fail)?;
    let expected = widget
        .search_value()
        .map(|value| value.trim().to_lowercase())
        .unwrap_or_default();
    if let Some(outcome) = widget.last_filter() {
        prop_assert_eq!(&outcome.keyword, &expected);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: filter_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(FILTER_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn visibility_follows_keyword_containment(
        faqs in faq_strategy(),
        keyword in text_strategy(3),
    ) {
        assert_filter_matches_search_text(&faqs, &keyword)?;
    }

    #[test]
    fn highlighting_is_idempotent_and_reversible(
        faqs in faq_strategy(),
        keyword in text_strategy(3),
    ) {
        assert_highlight_is_idempotent_and_reversible(&faqs, &keyword)?;
    }

    #[test]
    fn random_interaction_keeps_widget_consistent(
        faqs in faq_strategy(),
        actions in vec(ui_action_strategy(), 1..=24),
    ) {
        assert_action_sequence_keeps_invariants(&faqs, &actions)?;
    }
}
