use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, MoneyCents, OfferCmd, User, UserCmd, Wish, WishCmd};
use migration::MigratorTrait;
use tempfile::TempDir;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn user(engine: &Engine, username: &str) -> User {
    engine
        .new_user(UserCmd::new(
            username,
            format!("{username}@example.com"),
            "password",
        ))
        .await
        .unwrap()
}

async fn wish(engine: &Engine, owner: &User, price: i64) -> Wish {
    engine
        .new_wish(WishCmd::new("Bike", MoneyCents::new(price)), owner.id)
        .await
        .unwrap()
}

async fn pledge(
    engine: &Engine,
    wish: &Wish,
    payer: &User,
    amount: i64,
) -> Result<engine::Offer, EngineError> {
    engine
        .create_offer(OfferCmd::new(wish.id, payer.id, MoneyCents::new(amount)))
        .await
}

async fn count_offers(db: &DatabaseConnection) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM offers",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn offer_updates_raised_and_is_listed_on_wish() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let bike = wish(&engine, &alice, 10_000).await;

    let offer = engine
        .create_offer(OfferCmd::new(bike.id, bob.id, MoneyCents::new(2_500)).hidden(true))
        .await
        .unwrap();
    assert_eq!(offer.amount, MoneyCents::new(2_500));
    assert_eq!(offer.user_id, bob.id);
    assert_eq!(offer.item_id, bike.id);
    assert!(offer.hidden);

    let bike = engine.wish(bike.id).await.unwrap();
    assert_eq!(bike.raised, MoneyCents::new(2_500));
    let offer_ids: Vec<Uuid> = bike.offers.iter().map(|o| o.id).collect();
    assert_eq!(offer_ids, vec![offer.id]);
}

#[tokio::test]
async fn raised_never_exceeds_price_across_many_offers() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let carol = user(&engine, "carol").await;
    let bike = wish(&engine, &alice, 1_000).await;

    let amounts = [300, 450, 400, 250, 1, 5, 100];
    for (i, amount) in amounts.into_iter().enumerate() {
        let payer = if i % 2 == 0 { &bob } else { &carol };
        let _ = pledge(&engine, &bike, payer, amount).await;
        let current = engine.wish(bike.id).await.unwrap();
        assert!(current.raised <= current.price);
    }

    let bike = engine.wish(bike.id).await.unwrap();
    let sum: i64 = bike.offers.iter().map(|offer| offer.amount.cents()).sum();
    assert_eq!(bike.raised.cents(), sum);
    assert_eq!(bike.raised, MoneyCents::new(1_000));
}

#[tokio::test]
async fn owner_cannot_fund_own_wish() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bike = wish(&engine, &alice, 10_000).await;

    let err = pledge(&engine, &bike, &alice, 500).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidOperation("cannot fund own wish".to_string())
    );
    assert_eq!(engine.wish(bike.id).await.unwrap().raised, MoneyCents::ZERO);
    assert_eq!(count_offers(&db).await, 0);
}

#[tokio::test]
async fn fully_funded_wish_rejects_any_offer() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let carol = user(&engine, "carol").await;
    let bike = wish(&engine, &alice, 10_000).await;

    pledge(&engine, &bike, &bob, 10_000).await.unwrap();

    for (payer, amount) in [(&bob, 1), (&carol, 1), (&carol, 50_000)] {
        let err = pledge(&engine, &bike, payer, amount).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidOperation("wish already fully funded".to_string())
        );
    }
    // Self-funding is checked before the funded state.
    let err = pledge(&engine, &bike, &alice, 1).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidOperation("cannot fund own wish".to_string())
    );

    assert_eq!(
        engine.wish(bike.id).await.unwrap().raised,
        MoneyCents::new(10_000)
    );
    assert_eq!(count_offers(&db).await, 1);
}

#[tokio::test]
async fn overfunding_boundary() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let bike = wish(&engine, &alice, 100).await;
    pledge(&engine, &bike, &bob, 90).await.unwrap();

    let err = pledge(&engine, &bike, &bob, 11).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidOperation("pledge exceeds remaining price".to_string())
    );
    assert_eq!(engine.wish(bike.id).await.unwrap().raised, MoneyCents::new(90));
    assert_eq!(count_offers(&db).await, 1);

    pledge(&engine, &bike, &bob, 10).await.unwrap();
    let bike = engine.wish(bike.id).await.unwrap();
    assert_eq!(bike.raised, MoneyCents::new(100));
    assert!(bike.is_fully_funded());
    assert_eq!(count_offers(&db).await, 2);
}

#[tokio::test]
async fn non_positive_amount_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let bike = wish(&engine, &alice, 100).await;

    for amount in [0, -10] {
        let err = pledge(&engine, &bike, &bob, amount).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
    assert_eq!(count_offers(&db).await, 0);
}

#[tokio::test]
async fn unknown_wish_or_user_is_not_found() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let bike = wish(&engine, &alice, 100).await;

    let err = engine
        .create_offer(OfferCmd::new(Uuid::new_v4(), bob.id, MoneyCents::new(10)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("wish".to_string()));

    let err = engine
        .create_offer(OfferCmd::new(bike.id, Uuid::new_v4(), MoneyCents::new(10)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("user".to_string()));

    assert_eq!(engine.wish(bike.id).await.unwrap().raised, MoneyCents::ZERO);
    assert_eq!(count_offers(&db).await, 0);
}

#[tokio::test]
async fn failed_offer_insert_rolls_back_raised() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let bike = wish(&engine, &alice, 100).await;
    pledge(&engine, &bike, &bob, 30).await.unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_string(
        backend,
        "CREATE TRIGGER fail_offer BEFORE INSERT ON offers \
         BEGIN SELECT RAISE(ABORT, 'offer insert disabled'); END;",
    ))
    .await
    .unwrap();

    let err = pledge(&engine, &bike, &bob, 20).await.unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    assert_eq!(engine.wish(bike.id).await.unwrap().raised, MoneyCents::new(30));
    assert_eq!(count_offers(&db).await, 1);
}

async fn engine_with_file_db(dir: &TempDir) -> (Arc<Engine>, DatabaseConnection) {
    let path = dir.path().join("wishlist.db");
    let db = Database::connect(format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (Arc::new(engine), db)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pledges_cannot_overfund() {
    let dir = TempDir::new().unwrap();
    let (engine, db) = engine_with_file_db(&dir).await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let carol = user(&engine, "carol").await;

    for round in 0..25 {
        let bike = wish(&engine, &alice, 100).await;
        let wish_id = bike.id;

        let handles: Vec<_> = [bob.id, carol.id]
            .into_iter()
            .map(|payer| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine
                        .create_offer(OfferCmd::new(wish_id, payer, MoneyCents::new(60)))
                        .await
                })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(
            results.iter().filter(|r| r.is_ok()).count(),
            1,
            "round {round}: {results:?}"
        );
        let err = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(
            matches!(err, EngineError::InvalidOperation(_)),
            "round {round}: {err:?}"
        );
        assert_eq!(
            engine.wish(bike.id).await.unwrap().raised,
            MoneyCents::new(60)
        );
    }

    assert_eq!(count_offers(&db).await, 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_small_pledges_fill_exactly_to_price() {
    let dir = TempDir::new().unwrap();
    let (engine, db) = engine_with_file_db(&dir).await;
    let alice = user(&engine, "alice").await;
    let bike = wish(&engine, &alice, 100).await;
    let wish_id = bike.id;

    let mut payers = Vec::new();
    for n in 0..8 {
        payers.push(user(&engine, &format!("payer{n}")).await);
    }

    // 8 x 3 pledges of 5 = 120 asked for 100.
    let mut handles = Vec::new();
    for payer in &payers {
        for _ in 0..3 {
            let engine = Arc::clone(&engine);
            let payer = payer.id;
            handles.push(tokio::spawn(async move {
                engine
                    .create_offer(OfferCmd::new(wish_id, payer, MoneyCents::new(5)))
                    .await
            }));
        }
    }
    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    let bike = engine.wish(bike.id).await.unwrap();
    assert!(bike.raised <= bike.price);
    assert_eq!(bike.raised.cents(), accepted * 5);
    assert_eq!(count_offers(&db).await, accepted);
}

#[tokio::test]
async fn offers_of_user_with_wishes() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let bike = wish(&engine, &alice, 1_000).await;
    let book = engine
        .new_wish(WishCmd::new("Book", MoneyCents::new(30)), alice.id)
        .await
        .unwrap();

    let first = pledge(&engine, &bike, &bob, 100).await.unwrap();
    let second = pledge(&engine, &book, &bob, 30).await.unwrap();
    pledge(&engine, &bike, &bob, 50).await.unwrap();

    let offers = engine.offers(bob.id).await.unwrap();
    assert_eq!(offers.len(), 3);
    assert!(offers.iter().all(|detail| detail.user.id == bob.id));
    assert!(
        offers
            .iter()
            .any(|detail| detail.offer.id == second.id && detail.item.name == "Book")
    );

    assert!(engine.offers(alice.id).await.unwrap().is_empty());

    let detail = engine.offer(first.id).await.unwrap();
    assert_eq!(detail.offer.id, first.id);
    assert_eq!(detail.offer.amount, MoneyCents::new(100));
    assert_eq!(detail.item.id, bike.id);
    assert_eq!(detail.item.owner.id, alice.id);

    assert_eq!(
        engine.offer(Uuid::new_v4()).await.unwrap_err(),
        EngineError::NotFound("offer".to_string())
    );
}
