use ghg_narrative::{
    FallbackBuilder, FallbackReason, NarrativeLanguage, NarrativeOrigin, Narrator, StructuralKind, Violation,
};
use ghg_test_utils::{
    acme_config, acme_dataset, acme_dataset_with_total, FailingGenerator, FixedGenerator, RecordingGenerator,
    SlowGenerator,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_fallback_states_total_and_shares() {
    let text = FallbackBuilder::new(acme_config()).build(&acme_dataset());
    assert!(text.contains("Acme"));
    assert!(text.contains("100"));
    assert!(text.contains("30.0%"));
    assert!(text.contains("70.0%"));
}

#[tokio::test]
async fn test_accepted_generation() {
    let generator = Arc::new(FixedGenerator::new(
        "Acme reported total emissions of 100 tCO2e in 2024, with Part A at 30.0% and Part B at 70.0%.",
    ));
    let narrator = Narrator::new(acme_config()).with_generator(generator.clone());
    let narrative = narrator.narrate(&acme_dataset()).await;
    assert_eq!(narrative.origin, NarrativeOrigin::Generated);
    assert!(narrative.text.starts_with("Acme reported"));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_speculative_candidate_is_replaced() {
    let generator = Arc::new(FixedGenerator::new("Revenue grew by an estimated 12% this year"));
    let narrator = Narrator::new(acme_config()).with_generator(generator.clone());
    let narrative = narrator.narrate(&acme_dataset()).await;

    assert_eq!(
        narrative.origin,
        NarrativeOrigin::Fallback(FallbackReason::Rejected {
            violations: vec![Violation::SpeculativeLanguage {
                term: "estimat".to_string()
            }],
        })
    );
    assert_eq!(narrative.text, narrator.fallback(&acme_dataset()));
    assert_eq!(generator.calls(), 1, "rejection does not trigger a retry");
}

#[tokio::test]
async fn test_markdown_candidates_are_replaced() {
    for (candidate, kind) in [("**Summary**", StructuralKind::Emphasis), ("## Emissions", StructuralKind::Heading)] {
        let narrator = Narrator::new(acme_config()).with_generator(Arc::new(FixedGenerator::new(candidate)));
        let narrative = narrator.narrate(&acme_dataset()).await;
        match narrative.origin {
            NarrativeOrigin::Fallback(FallbackReason::Rejected { violations }) => {
                assert!(violations.contains(&Violation::StructuralMarker { kind, line: 1 }), "{candidate}");
            }
            other => panic!("expected rejection for {candidate}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_timeout_with_zero_total_yields_exact_fallback() {
    let dataset = acme_dataset_with_total("0");
    let narrator = Narrator::new(acme_config())
        .with_generator(Arc::new(SlowGenerator::new(Duration::from_secs(30), "late")))
        .with_timeout(Duration::from_millis(20));

    let narrative = narrator.narrate(&dataset).await;
    assert_eq!(narrative.origin, NarrativeOrigin::Fallback(FallbackReason::Timeout));
    assert_eq!(narrative.text, FallbackBuilder::new(acme_config()).build(&dataset));
    assert!(!narrative.text.contains('%'));
}

#[tokio::test]
async fn test_service_error_falls_back() {
    let narrator = Narrator::new(acme_config()).with_generator(Arc::new(FailingGenerator { status: 503 }));
    let narrative = narrator.narrate(&acme_dataset()).await;
    match narrative.origin {
        NarrativeOrigin::Fallback(FallbackReason::Failed { error }) => assert!(error.contains("503")),
        other => panic!("unexpected origin {other:?}"),
    }
}

#[tokio::test]
async fn test_request_carries_dataset_figures() {
    let generator = Arc::new(RecordingGenerator::new("Acme emitted 100 tCO2e."));
    let narrator = Narrator::new(acme_config()).with_generator(generator.clone());
    let narrative = narrator.narrate(&acme_dataset()).await;
    assert!(narrative.is_generated());

    let request = generator.last_request().await.expect("request recorded");
    assert!(request.user.contains("Entity: Acme"));
    assert!(request.user.contains("Total emissions: 100 tCO2e"));
    assert!(request.user.contains("Part A 30.0%"));
    assert!(request.system.contains("plain text"));
}

#[tokio::test]
async fn test_chinese_fallback_without_generator() {
    let config = acme_config().with_language(NarrativeLanguage::Chinese);
    let narrative = Narrator::new(config).narrate(&acme_dataset()).await;
    assert_eq!(narrative.origin, NarrativeOrigin::Fallback(FallbackReason::NoGenerator));
    assert!(narrative.text.contains("总排放量为100tCO2e"));
    assert!(narrative.text.contains("（占比30.0%）"));
}
