use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, MoneyCents, OfferCmd, User, UserCmd, WishCmd, WishPatch, WishlistCmd,
};
use migration::MigratorTrait;
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

async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn new_wish_starts_empty() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;

    let wish = engine
        .new_wish(
            WishCmd::new("  Bike ", "120.50".parse().unwrap())
                .link("https://shop.example/bike")
                .description("red one"),
            alice.id,
        )
        .await
        .unwrap();
    assert_eq!(wish.name, "Bike");
    assert_eq!(wish.price, MoneyCents::new(12_050));
    assert_eq!(wish.raised, MoneyCents::ZERO);
    assert_eq!(wish.copied, 0);
    assert_eq!(wish.owner.id, alice.id);
    assert_eq!(wish.image, None);

    let stored = engine.wish(wish.id).await.unwrap();
    assert_eq!(stored.name, "Bike");
    assert_eq!(stored.link.as_deref(), Some("https://shop.example/bike"));
    assert!(stored.offers.is_empty());
}

#[tokio::test]
async fn new_wish_validates_input() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;

    let err = engine
        .new_wish(WishCmd::new("Bike", MoneyCents::new(-1)), alice.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidAmount("price must be >= 0".to_string()));

    let err = engine
        .new_wish(WishCmd::new("   ", MoneyCents::new(100)), alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .new_wish(WishCmd::new("Bike", MoneyCents::new(100)), Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("user".to_string()));

    // A free gift is allowed.
    engine
        .new_wish(WishCmd::new("Hug", MoneyCents::ZERO), alice.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_wish_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    assert_eq!(
        engine.wish(Uuid::new_v4()).await.unwrap_err(),
        EngineError::NotFound("wish".to_string())
    );
}

#[tokio::test]
async fn feeds_are_ordered_and_capped() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;

    let mut ids = Vec::new();
    for i in 0..45 {
        let wish = engine
            .new_wish(WishCmd::new(format!("wish {i}"), MoneyCents::new(100)), alice.id)
            .await
            .unwrap();
        ids.push(wish.id);
    }

    let last = engine.last_wishes().await.unwrap();
    assert_eq!(last.len() as u64, engine::LAST_WISHES_LIMIT);
    assert_eq!(last[0].id, ids[44]);
    assert!(last.iter().all(|wish| wish.id != ids[0]));

    engine.copy_wish(ids[3], bob.id).await.unwrap();
    engine.copy_wish(ids[3], bob.id).await.unwrap();
    engine.copy_wish(ids[7], bob.id).await.unwrap();

    let top = engine.top_wishes().await.unwrap();
    assert_eq!(top.len() as u64, engine::TOP_WISHES_LIMIT);
    assert_eq!(top[0].id, ids[3]);
    assert_eq!(top[0].copied, 2);
    assert_eq!(top[1].id, ids[7]);
    assert_eq!(top[1].copied, 1);

    let mine = engine.wishes_by_owner(bob.id).await.unwrap();
    assert_eq!(mine.len(), 3);
    assert!(mine.iter().all(|wish| wish.owner.id == bob.id));
}

#[tokio::test]
async fn only_owner_can_edit_or_remove() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let wish = engine
        .new_wish(WishCmd::new("Bike", MoneyCents::new(100)), alice.id)
        .await
        .unwrap();

    let patch = WishPatch {
        name: Some("Stolen".to_string()),
        ..Default::default()
    };
    let err = engine
        .update_wish(wish.id, patch, bob.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("cannot edit someone else's wish".to_string())
    );

    let err = engine.remove_wish(wish.id, bob.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("cannot remove someone else's wish".to_string())
    );
    assert_eq!(count(&db, "wishes").await, 1);

    let patch = WishPatch {
        name: Some("Road bike".to_string()),
        price: Some(MoneyCents::new(250)),
        image: Some("https://img.example/bike.png".to_string()),
        ..Default::default()
    };
    let updated = engine.update_wish(wish.id, patch, alice.id).await.unwrap();
    assert_eq!(updated.name, "Road bike");
    assert_eq!(updated.price, MoneyCents::new(250));
    assert_eq!(updated.image.as_deref(), Some("https://img.example/bike.png"));
    assert!(updated.updated_at >= wish.updated_at);
}

#[tokio::test]
async fn price_is_locked_once_offers_exist() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let wish = engine
        .new_wish(WishCmd::new("Bike", MoneyCents::new(100)), alice.id)
        .await
        .unwrap();
    engine
        .create_offer(OfferCmd::new(wish.id, bob.id, MoneyCents::new(40)))
        .await
        .unwrap();

    for price in [10, 100, 500] {
        let patch = WishPatch {
            price: Some(MoneyCents::new(price)),
            ..Default::default()
        };
        let err = engine.update_wish(wish.id, patch, alice.id).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidOperation("cannot change price once offers exist".to_string())
        );
    }

    let patch = WishPatch {
        description: Some("any colour".to_string()),
        ..Default::default()
    };
    let updated = engine.update_wish(wish.id, patch, alice.id).await.unwrap();
    assert_eq!(updated.price, MoneyCents::new(100));
    assert_eq!(updated.raised, MoneyCents::new(40));
    assert_eq!(updated.description.as_deref(), Some("any colour"));
    assert_eq!(updated.offers.len(), 1);
}

#[tokio::test]
async fn remove_wish_drops_offers_and_memberships() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let bike = engine
        .new_wish(WishCmd::new("Bike", MoneyCents::new(100)), alice.id)
        .await
        .unwrap();
    let book = engine
        .new_wish(WishCmd::new("Book", MoneyCents::new(20)), alice.id)
        .await
        .unwrap();
    engine
        .create_offer(OfferCmd::new(bike.id, bob.id, MoneyCents::new(40)))
        .await
        .unwrap();
    let list = engine
        .new_wishlist(WishlistCmd::new("Birthday", vec![bike.id, book.id]), bob.id)
        .await
        .unwrap();

    let removed = engine.remove_wish(bike.id, alice.id).await.unwrap();
    assert_eq!(removed.id, bike.id);
    assert_eq!(removed.offers.len(), 1);

    assert_eq!(count(&db, "offers").await, 0);
    assert_eq!(count(&db, "wishes").await, 1);
    let list = engine.wishlist(list.id).await.unwrap();
    let items: Vec<Uuid> = list.items.iter().map(|wish| wish.id).collect();
    assert_eq!(items, vec![book.id]);

    assert_eq!(
        engine.wish(bike.id).await.unwrap_err(),
        EngineError::NotFound("wish".to_string())
    );
}

#[tokio::test]
async fn copy_wish_bumps_counter_and_starts_from_zero() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let carol = user(&engine, "carol").await;
    let source = engine
        .new_wish(
            WishCmd::new("Bike", MoneyCents::new(100))
                .link("https://shop.example/bike")
                .image("https://img.example/bike.png"),
            alice.id,
        )
        .await
        .unwrap();
    engine
        .create_offer(OfferCmd::new(source.id, carol.id, MoneyCents::new(60)))
        .await
        .unwrap();

    let copy = engine.copy_wish(source.id, bob.id).await.unwrap();
    assert_ne!(copy.id, source.id);
    assert_eq!(copy.owner.id, bob.id);
    assert_eq!(copy.name, source.name);
    assert_eq!(copy.link, source.link);
    assert_eq!(copy.image, source.image);
    assert_eq!(copy.price, source.price);
    assert_eq!(copy.raised, MoneyCents::ZERO);
    assert_eq!(copy.copied, 0);

    let source = engine.wish(source.id).await.unwrap();
    assert_eq!(source.copied, 1);
    assert_eq!(source.raised, MoneyCents::new(60));

    // Copying one's own wish is allowed too.
    engine.copy_wish(source.id, alice.id).await.unwrap();
    assert_eq!(engine.wish(source.id).await.unwrap().copied, 2);

    assert_eq!(
        engine.copy_wish(Uuid::new_v4(), bob.id).await.unwrap_err(),
        EngineError::NotFound("wish".to_string())
    );
}
