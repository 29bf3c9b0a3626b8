use rusty_relay::core::channel::{Channel, ChannelDirectory};
use rusty_relay::core::session::SessionManager;
use tokio::sync::mpsc;
use warp::ws::Message;

#[test]
fn test_channel_member_management() {
    let mut channel = Channel::default();

    assert!(channel.add_member("c1".to_string()));
    assert!(!channel.add_member("c1".to_string()));
    assert_eq!(channel.member_count(), 1);
    assert!(channel.has_member("c1"));

    assert!(channel.remove_member("c1"));
    assert!(!channel.remove_member("c1"));
    assert!(channel.is_empty());
}

#[test]
fn test_join_creates_channel_lazily() {
    let mut directory = ChannelDirectory::new();
    assert!(!directory.contains("general"));
    assert!(directory.members_of("general").is_empty());

    directory.join("general", "c1".to_string());
    assert!(directory.contains("general"));
    assert_eq!(directory.channel_count(), 1);
    assert_eq!(directory.members_of("general").to_vec(), vec!["c1".to_string()]);
}

#[test]
fn test_members_keep_join_order() {
    let mut directory = ChannelDirectory::new();
    directory.join("general", "c2".to_string());
    directory.join("general", "c1".to_string());
    directory.join("general", "c3".to_string());
    directory.join("general", "c1".to_string());

    assert_eq!(
        directory.members_of("general").to_vec(),
        vec!["c2".to_string(), "c1".to_string(), "c3".to_string()]
    );
}

#[test]
fn test_last_leave_removes_channel() {
    let mut directory = ChannelDirectory::new();
    directory.join("general", "c1".to_string());
    directory.join("general", "c2".to_string());

    directory.leave("general", "c1");
    assert!(directory.contains("general"));

    directory.leave("general", "c2");
    assert!(!directory.contains("general"));
    assert_eq!(directory.channel_count(), 0);
    assert!(directory.members_of("general").is_empty());
}

#[test]
fn test_leave_is_idempotent() {
    let mut directory = ChannelDirectory::new();
    directory.leave("nowhere", "c1");
    directory.join("general", "c1".to_string());
    directory.leave("general", "c9");
    directory.leave("", "c1");

    assert_eq!(directory.members_of("general").to_vec(), vec!["c1".to_string()]);
}

#[test]
fn test_broadcast_skips_sender() {
    let mut sessions = SessionManager::new();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    let (tx3, mut rx3) = mpsc::unbounded_channel();
    let c1 = sessions.register(tx1);
    let c2 = sessions.register(tx2);
    let c3 = sessions.register(tx3);

    let mut directory = ChannelDirectory::new();
    directory.join("general", c1.clone());
    directory.join("general", c2.clone());
    directory.join("other", c3.clone());

    let delivered = directory.broadcast("general", &c1, &Message::text("hello"), &sessions);
    assert_eq!(delivered, 1);

    assert!(rx1.try_recv().is_err());
    assert_eq!(rx2.try_recv().unwrap().to_str().unwrap(), "hello");
    assert!(rx3.try_recv().is_err());
}

#[test]
fn test_broadcast_survives_dead_member() {
    let mut sessions = SessionManager::new();
    let (tx1, _rx1) = mpsc::unbounded_channel();
    let (tx2, rx2) = mpsc::unbounded_channel();
    let (tx3, mut rx3) = mpsc::unbounded_channel();
    let c1 = sessions.register(tx1);
    let c2 = sessions.register(tx2);
    let c3 = sessions.register(tx3);
    drop(rx2);

    let mut directory = ChannelDirectory::new();
    directory.join("general", c1.clone());
    directory.join("general", c2);
    directory.join("general", c3);

    let delivered = directory.broadcast("general", &c1, &Message::text("hello"), &sessions);
    assert_eq!(delivered, 1);
    assert!(rx3.try_recv().is_ok());
}

#[test]
fn test_broadcast_to_missing_channel_is_noop() {
    let sessions = SessionManager::new();
    let directory = ChannelDirectory::new();
    assert_eq!(directory.broadcast("ghost", "c1", &Message::text("x"), &sessions), 0);
}
