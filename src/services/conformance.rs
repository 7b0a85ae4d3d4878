//! Behaviour every store must share. Each case expects an empty store.

use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::models::post::PostInput;
use crate::models::tag::TagInput;
use crate::models::user::{UserInput, DEFAULT_IMAGE_URL};

use super::BlogStore;

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn tag_names_of<S: BlogStore>(store: &S, post_id: i32) -> Vec<String> {
    store
        .post_with_tags(post_id)
        .await
        .unwrap()
        .tags
        .into_iter()
        .map(|t| t.name)
        .collect()
}

pub async fn create_then_get_user<S: BlogStore>(store: &S) {
    let with_image = store
        .create_user(&UserInput::new(
            "Test",
            "User",
            Some("https://cdn-icons-png.flaticon.com/512/25/25634.png"),
        ))
        .await
        .unwrap();
    let plain = store
        .create_user(&UserInput::new("  Demo ", "User", None))
        .await
        .unwrap();

    let fetched = store.get_user(with_image.id).await.unwrap();
    assert_eq!(fetched, with_image);
    assert_eq!((fetched.first_name.as_str(), fetched.last_name.as_str()), ("Test", "User"));

    let fetched = store.get_user(plain.id).await.unwrap();
    assert_eq!(fetched.first_name, "Demo");
    assert_eq!(fetched.image_url, DEFAULT_IMAGE_URL);
}

pub async fn update_user_keeps_identity<S: BlogStore>(store: &S) {
    let user = store
        .create_user(&UserInput::new("Test", "User", Some("https://example.com/a.png")))
        .await
        .unwrap();

    let edited = store
        .update_user(user.id, &UserInput::new("Beta", "Tester", None))
        .await
        .unwrap();

    assert_eq!(edited.id, user.id);
    assert_eq!((edited.first_name.as_str(), edited.last_name.as_str()), ("Beta", "Tester"));
    // replacement semantics: a dropped image falls back to the placeholder
    assert_eq!(edited.image_url, DEFAULT_IMAGE_URL);
    assert_eq!(store.list_users().await.unwrap(), vec![edited]);
}

pub async fn invalid_input_writes_nothing<S: BlogStore>(store: &S) {
    let err = store
        .create_user(&UserInput::new("", "User", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation { field: "first_name", .. }));
    assert!(store.list_users().await.unwrap().is_empty());

    let user = store
        .create_user(&UserInput::new("Test", "User", None))
        .await
        .unwrap();
    let long_title = "t".repeat(51);
    let err = store
        .create_post(user.id, &PostInput::new(&long_title, "body"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation { field: "title", .. }));
    assert!(store.user_with_posts(user.id).await.unwrap().posts.is_empty());

    let err = store.create_tag(&TagInput::new("  ")).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation { field: "name", .. }));
    assert!(store.list_tags().await.unwrap().is_empty());
}

pub async fn missing_ids_report_not_found<S: BlogStore>(store: &S) {
    let not_found = |r: Result<(), StoreError>, entity: &str| match r {
        Err(StoreError::NotFound { entity: e, id: 404 }) => assert_eq!(e, entity),
        other => panic!("expected {entity} 404 not found, got {other:?}"),
    };

    not_found(store.get_user(404).await.map(drop), "user");
    not_found(store.user_with_posts(404).await.map(drop), "user");
    not_found(
        store
            .update_user(404, &UserInput::new("A", "B", None))
            .await
            .map(drop),
        "user",
    );
    not_found(store.delete_user(404).await, "user");

    not_found(store.get_post(404).await.map(drop), "post");
    not_found(store.post_with_tags(404).await.map(drop), "post");
    not_found(
        store
            .update_post(404, &PostInput::new("t", "c"), &BTreeSet::new())
            .await
            .map(drop),
        "post",
    );
    not_found(store.delete_post(404).await, "post");

    not_found(store.get_tag(404).await.map(drop), "tag");
    not_found(store.tag_with_posts(404).await.map(drop), "tag");
    not_found(
        store.update_tag(404, &TagInput::new("x")).await.map(drop),
        "tag",
    );
    not_found(store.delete_tag(404).await, "tag");
}

pub async fn create_post_requires_user<S: BlogStore>(store: &S) {
    let err = store
        .create_post(404, &PostInput::new("Orphan", "body"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "user", id: 404 }));
}

pub async fn post_lifecycle_scenario<S: BlogStore>(store: &S) {
    let user = store
        .create_user(&UserInput::new("Test", "User", None))
        .await
        .unwrap();
    let post = store
        .create_post(user.id, &PostInput::new("Test Post", "body"))
        .await
        .unwrap();
    assert_eq!(post.user_id, user.id);

    let fetched = store.get_post(post.id).await.unwrap();
    assert_eq!(fetched.title, "Test Post");
    assert_eq!(fetched.created_at, post.created_at);

    let detail = store.post_with_tags(post.id).await.unwrap();
    assert_eq!(detail.author, user);
    assert!(detail.tags.is_empty());

    let red = store.create_tag(&TagInput::new("red")).await.unwrap();
    store
        .update_post(post.id, &PostInput::new("Test Post", "body"), &names(&["red"]))
        .await
        .unwrap();

    store.delete_post(post.id).await.unwrap();

    assert!(store.tag_with_posts(red.id).await.unwrap().posts.is_empty());
    assert_eq!(store.list_tags().await.unwrap(), vec![red]);
    assert!(store.user_with_posts(user.id).await.unwrap().posts.is_empty());
    assert!(matches!(
        store.get_post(post.id).await,
        Err(StoreError::NotFound { entity: "post", .. })
    ));
}

pub async fn reconciliation_replaces_tag_set<S: BlogStore>(store: &S) {
    let user = store
        .create_user(&UserInput::new("Test", "User", None))
        .await
        .unwrap();
    store.create_tag(&TagInput::new("red")).await.unwrap();
    store.create_tag(&TagInput::new("blue")).await.unwrap();
    let post = store
        .create_post(user.id, &PostInput::new("Colours", "body"))
        .await
        .unwrap();

    let edited = store
        .update_post(
            post.id,
            &PostInput::new("Colours!", "new body"),
            &names(&["red", "blue"]),
        )
        .await
        .unwrap();
    assert_eq!(edited.id, post.id);
    assert_eq!(edited.title, "Colours!");
    assert_eq!(tag_names_of(store, post.id).await, ["blue", "red"]);

    store
        .update_post(post.id, &PostInput::new("Colours!", "new body"), &names(&["blue"]))
        .await
        .unwrap();
    assert_eq!(tag_names_of(store, post.id).await, ["blue"]);

    // resubmitting the same set is stable
    store
        .update_post(post.id, &PostInput::new("Colours!", "new body"), &names(&["blue"]))
        .await
        .unwrap();
    assert_eq!(tag_names_of(store, post.id).await, ["blue"]);
}

pub async fn reconciliation_accepts_empty_set<S: BlogStore>(store: &S) {
    let user = store
        .create_user(&UserInput::new("Test", "User", None))
        .await
        .unwrap();
    store.create_tag(&TagInput::new("red")).await.unwrap();
    let post = store
        .create_post(user.id, &PostInput::new("Tagged", "body"))
        .await
        .unwrap();

    store
        .update_post(post.id, &PostInput::new("Tagged", "body"), &names(&["red"]))
        .await
        .unwrap();
    store
        .update_post(post.id, &PostInput::new("Untagged", "body"), &BTreeSet::new())
        .await
        .unwrap();

    let detail = store.post_with_tags(post.id).await.unwrap();
    assert!(detail.tags.is_empty());
    assert_eq!(detail.post.title, "Untagged");
}

pub async fn unknown_tag_leaves_post_untouched<S: BlogStore>(store: &S) {
    let user = store
        .create_user(&UserInput::new("Test", "User", None))
        .await
        .unwrap();
    store.create_tag(&TagInput::new("red")).await.unwrap();
    let post = store
        .create_post(user.id, &PostInput::new("Before", "body"))
        .await
        .unwrap();
    store
        .update_post(post.id, &PostInput::new("Before", "body"), &names(&["red"]))
        .await
        .unwrap();

    let err = store
        .update_post(
            post.id,
            &PostInput::new("After", "changed"),
            &names(&["red", "green"]),
        )
        .await
        .unwrap_err();
    match err {
        StoreError::UnknownTag(name) => assert_eq!(name, "green"),
        other => panic!("expected unknown tag, got {other:?}"),
    }

    let detail = store.post_with_tags(post.id).await.unwrap();
    assert_eq!(detail.post.title, "Before");
    assert_eq!(detail.post.content, "body");
    assert_eq!(detail.tag_names(), ["red"]);
}

pub async fn tag_names_are_unique<S: BlogStore>(store: &S) {
    let red = store.create_tag(&TagInput::new("red")).await.unwrap();
    let blue = store.create_tag(&TagInput::new("blue")).await.unwrap();

    let err = store.create_tag(&TagInput::new("red")).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(ref n) if n == "red"));

    let err = store
        .update_tag(blue.id, &TagInput::new("red"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(ref n) if n == "red"));
    assert_eq!(store.get_tag(blue.id).await.unwrap().name, "blue");

    // renaming a tag to its own name is not a conflict
    let same = store.update_tag(red.id, &TagInput::new("red")).await.unwrap();
    assert_eq!(same, red);

    let renamed = store
        .update_tag(red.id, &TagInput::new("crimson"))
        .await
        .unwrap();
    assert_eq!(renamed.id, red.id);
    assert_eq!(renamed.name, "crimson");
}

pub async fn deleting_tag_detaches_posts<S: BlogStore>(store: &S) {
    let user = store
        .create_user(&UserInput::new("Test", "User", None))
        .await
        .unwrap();
    let red = store.create_tag(&TagInput::new("red")).await.unwrap();
    store.create_tag(&TagInput::new("blue")).await.unwrap();

    let mut post_ids = Vec::new();
    for title in ["One", "Two"] {
        let post = store
            .create_post(user.id, &PostInput::new(title, "body"))
            .await
            .unwrap();
        store
            .update_post(post.id, &PostInput::new(title, "body"), &names(&["red", "blue"]))
            .await
            .unwrap();
        post_ids.push(post.id);
    }
    assert_eq!(store.tag_with_posts(red.id).await.unwrap().posts.len(), 2);

    store.delete_tag(red.id).await.unwrap();

    for id in post_ids {
        assert_eq!(tag_names_of(store, id).await, ["blue"]);
    }
    assert!(matches!(
        store.get_tag(red.id).await,
        Err(StoreError::NotFound { entity: "tag", .. })
    ));
    // the name is free again
    store.create_tag(&TagInput::new("red")).await.unwrap();
}

pub async fn deleting_post_detaches_tags<S: BlogStore>(store: &S) {
    let user = store
        .create_user(&UserInput::new("Test", "User", None))
        .await
        .unwrap();
    let red = store.create_tag(&TagInput::new("red")).await.unwrap();
    let keep = store
        .create_post(user.id, &PostInput::new("Keep", "body"))
        .await
        .unwrap();
    let dropped = store
        .create_post(user.id, &PostInput::new("Drop", "body"))
        .await
        .unwrap();
    for post in [&keep, &dropped] {
        store
            .update_post(post.id, &PostInput::new(&post.title, "body"), &names(&["red"]))
            .await
            .unwrap();
    }

    store.delete_post(dropped.id).await.unwrap();

    let detail = store.tag_with_posts(red.id).await.unwrap();
    let titles: Vec<_> = detail.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Keep"]);
}

pub async fn deleting_user_cascades_to_posts<S: BlogStore>(store: &S) {
    let doomed = store
        .create_user(&UserInput::new("Doomed", "User", None))
        .await
        .unwrap();
    let other = store
        .create_user(&UserInput::new("Other", "User", None))
        .await
        .unwrap();
    let red = store.create_tag(&TagInput::new("red")).await.unwrap();

    let gone = store
        .create_post(doomed.id, &PostInput::new("Gone", "body"))
        .await
        .unwrap();
    let kept = store
        .create_post(other.id, &PostInput::new("Kept", "body"))
        .await
        .unwrap();
    for post in [&gone, &kept] {
        store
            .update_post(post.id, &PostInput::new(&post.title, "body"), &names(&["red"]))
            .await
            .unwrap();
    }

    store.delete_user(doomed.id).await.unwrap();

    assert!(matches!(
        store.get_post(gone.id).await,
        Err(StoreError::NotFound { entity: "post", .. })
    ));
    assert_eq!(store.list_users().await.unwrap(), vec![other.clone()]);
    assert_eq!(store.user_with_posts(other.id).await.unwrap().posts, vec![kept.clone()]);
    assert_eq!(store.tag_with_posts(red.id).await.unwrap().posts, vec![kept]);
}

pub async fn listings_are_ordered<S: BlogStore>(store: &S) {
    for (first, last) in [("Zed", "Zulu"), ("Amy", "Alpha"), ("Mo", "Mike")] {
        store
            .create_user(&UserInput::new(first, last, None))
            .await
            .unwrap();
    }
    let ids: Vec<i32> = store
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    for name in ["pear", "apple", "fig"] {
        store.create_tag(&TagInput::new(name)).await.unwrap();
    }
    let tags: Vec<String> = store
        .list_tags()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(tags, ["apple", "fig", "pear"]);

    let author = ids[0];
    let mut post_ids = Vec::new();
    for title in ["first", "second", "third"] {
        let post = store
            .create_post(author, &PostInput::new(title, "body"))
            .await
            .unwrap();
        post_ids.push(post.id);
    }
    let listed: Vec<i32> = store
        .user_with_posts(author)
        .await
        .unwrap()
        .posts
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(listed, post_ids);
}
