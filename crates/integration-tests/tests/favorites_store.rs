//! The client favorites store against server-side favorites rules.

#![allow(clippy::unwrap_used)]

use muhan_client::FavoritesStore;
use muhan_core::{StoreId, UserId};
use muhan_integration_tests::InMemoryFavorites;
use uuid::Uuid;

fn alice() -> UserId {
    UserId::new(Uuid::from_u128(0xa11ce))
}

#[tokio::test]
async fn test_add_then_remove_round_trips() {
    let store = FavoritesStore::new(InMemoryFavorites::new(&[1, 2, 3]));
    let before = store.ids(alice()).await.unwrap();
    assert!(before.is_empty());

    assert!(store.add(alice(), StoreId::new(2)).await.unwrap());
    assert_eq!(store.api().saved_ids(), vec![StoreId::new(2)]);

    let listed = store.favorites(alice()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed.first().unwrap().store.id, StoreId::new(2));

    store.remove(alice(), StoreId::new(2)).await.unwrap();
    assert_eq!(store.ids(alice()).await.unwrap(), before);
    assert!(store.api().saved_ids().is_empty());
}

#[tokio::test]
async fn test_unknown_store_rolls_back() {
    let store = FavoritesStore::new(InMemoryFavorites::new(&[1]));
    let err = store.add(alice(), StoreId::new(99)).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(!store.is_favorite(alice(), StoreId::new(99)).await.unwrap());
}

#[tokio::test]
async fn test_newest_first() {
    let store = FavoritesStore::new(InMemoryFavorites::new(&[1, 2, 3]));
    for id in [1, 3, 2] {
        store.add(alice(), StoreId::new(id)).await.unwrap();
    }
    let order: Vec<i32> = store
        .favorites(alice())
        .await
        .unwrap()
        .iter()
        .map(|f| f.store.id.as_i32())
        .collect();
    assert_eq!(order, vec![2, 3, 1]);
}

#[tokio::test]
async fn test_removing_unsaved_store_is_harmless() {
    let store = FavoritesStore::new(InMemoryFavorites::new(&[1]));
    store.remove(alice(), StoreId::new(1)).await.unwrap();
    assert!(store.ids(alice()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let store = FavoritesStore::new(InMemoryFavorites::new(&[4]));
    assert!(store.toggle(alice(), StoreId::new(4)).await.unwrap());
    assert!(!store.toggle(alice(), StoreId::new(4)).await.unwrap());
    assert!(store.api().saved_ids().is_empty());
}
