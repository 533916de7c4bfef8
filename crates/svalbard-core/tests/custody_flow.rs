//! End-to-end token flows through the coordinator.

use assert_matches::assert_matches;
use svalbard_core::{
    AuthorizationStage, ErrorKind, Operation, OperationOutcome, ResponseClass,
};
use svalbard_testkit::{init_test_tracing, TestCustody};

#[tokio::test]
async fn store_then_retrieve_then_delete() {
    init_test_tracing();
    let custody = TestCustody::new();
    let coordinator = &custody.coordinator;

    let confirmation = coordinator
        .request_storage_token(custody.token_request("r1", "s1"))
        .await
        .unwrap();
    assert_eq!(
        confirmation.message,
        "Req. r1: storage token for share of [s1] sent to [email:owner@example.com]"
    );
    assert_eq!(confirmation.stage, AuthorizationStage::TokenDelivered);

    let delivery = custody.outbox.last_for(&TestCustody::recipient()).await.unwrap();
    assert!(delivery.encoded.starts_with("SVBD:r1:"));
    let token = delivery.message().unwrap().token;

    let stored = coordinator
        .store_share(custody.share_request(&token, "s1").with_value("share-bytes"))
        .await
        .unwrap();
    assert_eq!(
        stored.message,
        "Stored a share of secret [s1] for owner [email:owner@example.com]"
    );
    assert_eq!(stored.stage, AuthorizationStage::Redeemed);

    coordinator
        .request_retrieval_token(custody.token_request("r2", "s1"))
        .await
        .unwrap();
    let token = custody.last_token().await.unwrap();
    let value = coordinator
        .retrieve_share(custody.share_request(&token, "s1"))
        .await
        .unwrap();
    assert_eq!(value.expose(), "share-bytes");

    let confirmation = coordinator
        .request_deletion_token(custody.token_request("r3", "s1"))
        .await
        .unwrap();
    assert_eq!(
        confirmation.message,
        "Req. r3: deletion token for share of [s1] sent to [email:owner@example.com]"
    );
    let token = custody.last_token().await.unwrap();
    let deleted = coordinator
        .delete_share(custody.share_request(&token, "s1"))
        .await
        .unwrap();
    assert_eq!(
        deleted.message,
        "Deleted a share of secret [s1] of owner [email:owner@example.com]"
    );

    let rejection = coordinator
        .request_retrieval_token(custody.token_request("r4", "s1"))
        .await
        .unwrap_err();
    assert_eq!(rejection.message, "Req. r4: share not found.");
    assert_eq!(rejection.class, ResponseClass::NotFound);
}

#[tokio::test]
async fn perform_dispatches_on_operation() {
    let custody = TestCustody::new();
    let token = custody.obtain_token(Operation::Store, "s1").await;
    let outcome = custody
        .coordinator
        .perform(
            Operation::Store,
            custody.share_request(&token, "s1").with_value("v"),
        )
        .await
        .unwrap();
    assert_matches!(outcome, OperationOutcome::Stored(_));

    let token = custody.obtain_token(Operation::Retrieve, "s1").await;
    let outcome = custody
        .coordinator
        .perform(Operation::Retrieve, custody.share_request(&token, "s1"))
        .await
        .unwrap();
    assert_eq!(outcome.body(), "v");
}

#[tokio::test]
async fn owner_id_type_is_case_insensitive() {
    let custody = TestCustody::new();
    custody.store_share("s1", "v").await;

    custody
        .coordinator
        .request_retrieval_token(svalbard_core::TokenRequest::new(
            "r1",
            "EMAIL",
            "owner@example.com",
            "s1",
        ))
        .await
        .unwrap();
    let token = custody
        .outbox
        .last_token_for(&svalbard_core::Recipient::new("EMAIL", "owner@example.com"))
        .await
        .unwrap();
    let value = custody
        .coordinator
        .retrieve_share(custody.share_request(&token, "s1"))
        .await
        .unwrap();
    assert_eq!(value.expose(), "v");
}

#[tokio::test]
async fn existence_prechecks() {
    let custody = TestCustody::new();

    let rejection = custody
        .coordinator
        .request_deletion_token(custody.token_request("r1", "missing"))
        .await
        .unwrap_err();
    assert_eq!(rejection.message, "Req. r1: share not found.");
    assert_eq!(rejection.kind, ErrorKind::ShareNotFound);
    assert_eq!(rejection.stage, AuthorizationStage::Requested);

    custody.store_share("s1", "v").await;
    let rejection = custody
        .coordinator
        .request_storage_token(custody.token_request("r2", "s1"))
        .await
        .unwrap_err();
    assert_eq!(rejection.message, "Req. r2: share already exists.");
    assert_eq!(rejection.class, ResponseClass::Forbidden);
    assert_eq!(custody.channel.attempts(), 1);
}

#[tokio::test]
async fn share_deleted_after_retrieval_token_was_issued() {
    let custody = TestCustody::new();
    custody.store_share("s1", "v").await;
    let retrieval = custody.obtain_token(Operation::Retrieve, "s1").await;

    let deletion = custody.obtain_token(Operation::Delete, "s1").await;
    custody
        .coordinator
        .delete_share(custody.share_request(&deletion, "s1"))
        .await
        .unwrap();

    let rejection = custody
        .coordinator
        .retrieve_share(custody.share_request(&retrieval, "s1"))
        .await
        .unwrap_err();
    assert_eq!(rejection.message, "could not retrieve the share: share not found");
    assert_eq!(rejection.class, ResponseClass::NotFound);
}

#[tokio::test]
async fn concurrent_stores_have_one_winner() {
    let custody = TestCustody::new();
    let first = custody.obtain_token(Operation::Store, "s1").await;
    let second = custody.obtain_token(Operation::Store, "s1").await;
    assert_ne!(first, second);

    let (a, b) = tokio::join!(
        custody
            .coordinator
            .store_share(custody.share_request(&first, "s1").with_value("a")),
        custody
            .coordinator
            .store_share(custody.share_request(&second, "s1").with_value("b")),
    );

    let (winner, loser) = match (a, b) {
        (Ok(w), Err(l)) | (Err(l), Ok(w)) => (w, l),
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert_eq!(winner.stage, AuthorizationStage::Redeemed);
    assert_eq!(loser.stage, AuthorizationStage::Redeemed);
    assert_eq!(loser.message, "share already exists");
    assert_eq!(loser.class, ResponseClass::Forbidden);
}

#[tokio::test]
async fn redeemed_and_misscoped_tokens_are_not_valid() {
    let custody = TestCustody::new();
    let store_token = custody.obtain_token(Operation::Store, "s1").await;
    let request = custody.share_request(&store_token, "s1").with_value("V");
    custody.coordinator.store_share(request.clone()).await.unwrap();

    let rejection = custody.coordinator.store_share(request).await.unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::TokenNotValid);
    assert_eq!(rejection.message, "could not store the share: token not valid");

    let delete_token = custody.obtain_token(Operation::Delete, "s1").await;
    let rejection = custody
        .coordinator
        .retrieve_share(custody.share_request(&delete_token, "s1"))
        .await
        .unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::TokenNotValid);

    let retrieve_token = custody.obtain_token(Operation::Retrieve, "s1").await;
    let value = custody
        .coordinator
        .retrieve_share(custody.share_request(&retrieve_token, "s1"))
        .await
        .unwrap();
    assert_eq!(value.expose(), "V");
}
