//! End-to-end tests for the manager side: a client driving a running agent,
//! and notifications delivered to a receiver.

mod common;

use std::time::Duration;

use async_snmp_agent::notification::{NotificationReceiver, oids};
use async_snmp_agent::{
    Agent, Client, Error, ErrorStatus, GenericTrap, Notification, Value, VarBind, Version, oid,
};
use common::{
    COMMUNITY_RO, SYS_DESCR, if_entry, nonexistent_oid, sys_contact, sys_descr, sys_name,
    test_agent,
};

async fn running_agent() -> Agent {
    let agent = test_agent(Agent::builder()).await;
    let runner = agent.clone();
    tokio::spawn(async move {
        runner.run().await.unwrap();
    });
    agent
}

async fn client(agent: &Agent, v1: bool) -> Client {
    let target = agent.local_addr().to_string();
    let builder = if v1 { Client::v1(target) } else { Client::v2c(target) };
    builder
        .community(COMMUNITY_RO)
        .bind("127.0.0.1:0")
        .timeout(Duration::from_secs(2))
        .retries(0)
        .connect()
        .await
        .unwrap()
}

async fn receiver() -> NotificationReceiver {
    NotificationReceiver::builder()
        .bind("127.0.0.1:0")
        .community(COMMUNITY_RO)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn client_get_next_and_set() {
    let agent = running_agent().await;
    let client = client(&agent, false).await;

    let vb = client.get(&sys_descr()).await.unwrap();
    assert_eq!(vb.value(), &Value::from(SYS_DESCR));

    let missing = client.get(&nonexistent_oid()).await.unwrap();
    assert_eq!(missing.value(), &Value::NO_SUCH_OBJECT);

    let next = client.get_next(&if_entry()).await.unwrap();
    assert_eq!(next.oid, if_entry().join(&[1, 1]));

    let vb = client.set(&sys_name(), "renamed").await.unwrap();
    assert_eq!(vb.value(), &Value::from("renamed"));
    assert_eq!(client.get(&sys_name()).await.unwrap().value(), &Value::from("renamed"));
}

#[tokio::test]
async fn client_get_bulk() {
    let agent = running_agent().await;
    let client = client(&agent, false).await;

    let varbinds = client
        .get_bulk(&[sys_contact(), if_entry()], 1, 3)
        .await
        .unwrap();
    assert_eq!(varbinds.len(), 1 + 3);
    assert_eq!(varbinds[0].oid, sys_name());
    assert_eq!(varbinds[1].oid, if_entry().join(&[1, 1]));
    assert_eq!(varbinds[3].oid, if_entry().join(&[1, 10]));
}

#[tokio::test]
async fn client_v1_error_is_reported() {
    let agent = running_agent().await;
    let client = client(&agent, true).await;

    match client.get_many(&[sys_descr(), nonexistent_oid()]).await.unwrap_err() {
        Error::Snmp { status, index, oid, .. } => {
            assert_eq!(status, ErrorStatus::NoSuchName);
            assert_eq!(index, 2);
            assert_eq!(oid, Some(nonexistent_oid()));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = client.set(&sys_name(), Value::Integer(1)).await.unwrap_err();
    assert!(matches!(err, Error::Snmp { status: ErrorStatus::GenErr, index: 1, .. }));
}

#[tokio::test]
async fn traps_reach_receiver() {
    let receiver = receiver().await;
    let sender = Client::v2c(receiver.local_addr().to_string())
        .community(COMMUNITY_RO)
        .bind("127.0.0.1:0")
        .enterprise(oid!(1, 3, 6, 1, 4, 1, 99))
        .connect()
        .await
        .unwrap();

    sender.trap_v1(GenericTrap::LinkDown, 0, Vec::new()).await.unwrap();
    let (notification, source) = receiver.recv().await.unwrap();
    assert_eq!(source, sender.local_addr());
    assert_eq!(notification.version(), Version::V1);
    assert_eq!(notification.trap_oid(), oids::link_down());
    match &notification {
        Notification::TrapV1 { trap, .. } => assert_eq!(trap.enterprise, oid!(1, 3, 6, 1, 4, 1, 99)),
        other => panic!("expected a v1 trap, got {other:?}"),
    }

    let extra = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 2), Value::Integer(2));
    sender.trap(&oids::link_up(), vec![extra.clone()]).await.unwrap();
    let (notification, _) = receiver.recv().await.unwrap();
    assert_eq!(notification.version(), Version::V2c);
    assert!(!notification.is_confirmed());
    assert_eq!(notification.trap_oid(), oids::link_up());
    assert_eq!(notification.varbinds(), &[extra]);
}

#[tokio::test]
async fn inform_is_acknowledged() {
    let receiver = receiver().await;
    let listener = receiver.clone();
    let received = tokio::spawn(async move { listener.recv().await.unwrap().0 });

    let sender = Client::v2c(receiver.local_addr().to_string())
        .community(COMMUNITY_RO)
        .bind("127.0.0.1:0")
        .timeout(Duration::from_secs(2))
        .retries(1)
        .connect()
        .await
        .unwrap();

    let ack = sender.inform(&oids::warm_start(), Vec::new()).await.unwrap();
    assert_eq!(ack.len(), 2);
    assert_eq!(ack[0].oid, oids::sys_uptime());
    assert_eq!(ack[1].value(), &Value::ObjectIdentifier(oids::warm_start()));

    let notification = received.await.unwrap();
    assert!(notification.is_confirmed());
    assert_eq!(notification.trap_oid(), oids::warm_start());
}

#[tokio::test]
async fn receiver_skips_foreign_community() {
    let receiver = receiver().await;
    let stranger = Client::v2c(receiver.local_addr().to_string())
        .community(b"other")
        .bind("127.0.0.1:0")
        .connect()
        .await
        .unwrap();
    let friend = Client::v2c(receiver.local_addr().to_string())
        .community(COMMUNITY_RO)
        .bind("127.0.0.1:0")
        .connect()
        .await
        .unwrap();

    stranger.trap(&oids::cold_start(), Vec::new()).await.unwrap();
    friend.trap(&oids::warm_start(), Vec::new()).await.unwrap();

    let (notification, _) = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notification.trap_oid(), oids::warm_start());
    assert_eq!(receiver.ignored_pdus(), 1);
}
