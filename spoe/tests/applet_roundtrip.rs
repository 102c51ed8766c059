use std::time::Duration;

use haproxy_spop::{Action, AgentHello, Capability, Codec, Frame, Framer, Scope, Version};
use haproxy_spoe::{AckSink, Applet, FrameId, Notification, StreamId};

/// A minimal stand-in for an agent process: replies AGENT-HELLO to the
/// handshake, then ACKs every NOTIFY it receives with one SET-VAR action.
async fn fake_agent(io: tokio::io::DuplexStream) {
    let mut codec = Codec::new(io, Framer::new(16384));

    match codec.read_frame().await.unwrap() {
        Frame::HaproxyHello(_) => {}
        other => panic!("expected HAPROXY-HELLO, got {other:?}"),
    }

    codec
        .write_frame(Frame::AgentHello(AgentHello {
            version: Version::V2_0,
            max_frame_size: 16384,
            capabilities: vec![Capability::Fragmentation],
        }))
        .await
        .unwrap();

    match codec.read_frame().await.unwrap() {
        Frame::HaproxyNotify(notify) => {
            let ack = Frame::ack(
                notify.stream_id,
                notify.frame_id,
                vec![Action::set_var(Scope::Request, "seen", "yes")],
            );

            codec.write_frame(ack).await.unwrap();
        }
        other => panic!("expected HAPROXY-NOTIFY, got {other:?}"),
    }
}

#[derive(Default)]
struct CollectingSink {
    acked: Vec<(StreamId, FrameId, Vec<Action>)>,
}

impl AckSink for CollectingSink {
    fn ack(&mut self, stream_id: StreamId, frame_id: FrameId, actions: Vec<Action>, _aborted: bool) {
        self.acked.push((stream_id, frame_id, actions));
    }
}

#[tokio::test]
async fn handshake_then_notify_roundtrip() {
    let (engine_io, agent_io) = tokio::io::duplex(4096);

    let agent = tokio::spawn(fake_agent(agent_io));

    let mut applet = Applet::new(engine_io, 16384, "test-engine");

    applet
        .handshake(
            vec![Version::V2_0],
            vec![Capability::Fragmentation],
            16384,
            Duration::from_secs(1),
        )
        .await
        .expect("handshake should negotiate successfully");

    assert!(applet.negotiated().unwrap().supports_fragmentation());

    applet.queue(Notification {
        stream_id: 1,
        frame_id: 1,
        messages: vec![],
    });

    let mut sink = CollectingSink::default();

    applet.drive(&mut sink).await.expect("drive should complete");

    agent.await.unwrap();

    assert_eq!(sink.acked.len(), 1);
    assert_eq!(sink.acked[0].0, 1);
    assert_eq!(sink.acked[0].2.len(), 1);
}
