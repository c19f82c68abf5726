use chrono::Duration;
use skillpath_core::model::{
    AssessmentId, AssessmentResult, PersonalizationId, QuestionPayload, QuestionType,
    ScoredAssessment,
};
use skillpath_core::session::{AssessmentSession, SessionPhase};
use skillpath_core::time::fixed_now;
use storage::repository::{AssessmentResultRepository, SessionSnapshotRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn payloads(n: usize) -> Vec<QuestionPayload> {
    (0..n)
        .map(|i| QuestionPayload {
            kind: QuestionType::MultipleChoice,
            question: format!("Q{i}"),
            options: vec![format!("right-{i}"), format!("wrong-{i}")],
            correct_answer: format!("right-{i}"),
            explanation: String::new(),
        })
        .collect()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_snapshot_roundtrip_restores_session() {
    let repo = connect("memdb_snapshots").await;
    let id = AssessmentId::new("a-100");

    let mut session = AssessmentSession::from_payloads(id.clone(), payloads(3), fixed_now()).unwrap();
    session.select_answer("right-0").unwrap();
    session.advance(fixed_now()).unwrap();
    repo.save_snapshot(&session.snapshot(), fixed_now())
        .await
        .unwrap();

    session.select_answer("wrong-1").unwrap();
    repo.save_snapshot(&session.snapshot(), fixed_now() + Duration::seconds(5))
        .await
        .unwrap();

    let loaded = repo.load_snapshot(&id).await.unwrap().expect("snapshot");
    let restored = AssessmentSession::restore(loaded).unwrap();
    assert_eq!(restored.phase(), SessionPhase::InProgress);
    assert_eq!(restored.current_index(), 1);
    assert_eq!(restored.answers().len(), 2);
    assert_eq!(restored.running_score(), 1);

    assert!(repo.delete_snapshot(&id).await.unwrap());
    assert!(repo.load_snapshot(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_results_are_listed_newest_first() {
    let repo = connect("memdb_results").await;

    let mut ids = Vec::new();
    for (i, score) in [2_u32, 5, 3].into_iter().enumerate() {
        let scored = ScoredAssessment::new(
            AssessmentResult {
                score,
                max_score: 5,
                assessment_id: AssessmentId::new(format!("a-{i}")),
                personalization_id: PersonalizationId::new(format!("p-{i}")),
            },
            fixed_now() + Duration::minutes(i64::try_from(i).unwrap()),
        );
        ids.push(repo.append_result(&scored).await.unwrap());
    }

    let rows = repo.list_results(2).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].scored.result.assessment_id.as_str(), "a-2");
    assert_eq!(rows[1].scored.result.score, 5);

    let first = repo.get_result(ids[0]).await.unwrap();
    assert_eq!(first.result.personalization_id.as_str(), "p-0");
    assert_eq!(first.completed_at, fixed_now());

    assert!(matches!(
        repo.get_result(9_999).await,
        Err(StorageError::NotFound)
    ));
}
