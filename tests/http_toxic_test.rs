use bytes::Bytes;
use http_toxic::http::HttpResponse;
use http_toxic::toxic::{PipeExit, StreamChunk, StubControl, Toxic, ToxicStub};
use http_toxic::toxics::{HttpToxic, HttpToxicConfig};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

struct Harness {
    stub: ToxicStub,
    control: StubControl,
    input: mpsc::Sender<Option<StreamChunk>>,
    output: mpsc::Receiver<Option<StreamChunk>>,
}

fn harness() -> Harness {
    let (input, input_rx) = mpsc::channel(16);
    let (output_tx, output) = mpsc::channel(16);
    let (stub, control) = ToxicStub::new(input_rx, output_tx);
    Harness {
        stub,
        control,
        input,
        output,
    }
}

fn toxic() -> HttpToxic {
    HttpToxic::new(HttpToxicConfig {
        status_code: 502,
        response_headers: HashMap::from([
            ("X-Injected".to_string(), "yes".to_string()),
            ("content-type".to_string(), "text/plain".to_string()),
        ]),
        response_body: "bad gateway".to_string(),
    })
    .unwrap()
}

async fn send(h: &Harness, data: &'static [u8]) {
    h.input.send(Some(StreamChunk::new(data))).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rewrites_complete_response() {
        let mut h = harness();
        send(&h, b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 12\r\n\r\n<p>hello</p>").await;
        h.input.send(None).await.unwrap();

        let exit = toxic().pipe(&mut h.stub).await;
        assert_eq!(exit, PipeExit::Closed);

        let chunk = h.output.recv().await.flatten().unwrap();
        let res = HttpResponse::parse(&chunk.data).unwrap();
        assert_eq!(res.status.as_u16(), 502);
        assert_eq!(res.headers["x-injected"], "yes");
        assert_eq!(res.headers["content-type"], "text/plain");
        assert_eq!(&res.body[..], b"bad gateway");
        assert_eq!(res.headers["content-length"], "11");

        // nil 센티널이 다음 단계로 전달됨
        assert_eq!(h.output.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_passes_through_non_http() {
        let mut h = harness();
        let payloads: [&'static [u8]; 4] = [
            b"\x16\x03\x01\x00\xa5\x01\x00\x00\xa1\x03\x03",
            b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n",
            b"HTTP/1.1 200 OK\r\nContent-Length: +2\r\n\r\nok",
            b"",
        ];
        for payload in payloads {
            send(&h, payload).await;
        }
        h.input.send(None).await.unwrap();

        toxic().pipe(&mut h.stub).await;

        for payload in payloads {
            let chunk = h.output.recv().await.flatten().unwrap();
            assert_eq!(&chunk.data[..], payload);
        }
    }

    #[tokio::test]
    async fn test_split_response_passes_through() {
        let mut h = harness();
        let toxic = toxic();

        let body = "x".repeat(2 * toxic.buffer_size());
        let raw = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}", body.len(), body);
        let raw = Bytes::from(raw);

        let pieces: Vec<Bytes> = raw
            .chunks(toxic.buffer_size())
            .map(Bytes::copy_from_slice)
            .collect();
        assert!(pieces.len() > 1);

        for piece in &pieces {
            h.input.send(Some(StreamChunk::new(piece.clone()))).await.unwrap();
        }
        h.input.send(None).await.unwrap();

        toxic.pipe(&mut h.stub).await;

        let mut forwarded = Vec::new();
        while let Some(Some(chunk)) = h.output.recv().await {
            forwarded.push(chunk.data);
        }
        assert_eq!(forwarded, pieces);
    }

    #[tokio::test]
    async fn test_nil_closes_once_and_stops_consuming() {
        let mut h = harness();
        send(&h, b"first").await;
        h.input.send(None).await.unwrap();
        send(&h, b"after end").await;

        let exit = toxic().pipe(&mut h.stub).await;
        assert_eq!(exit, PipeExit::Closed);

        assert!(h.control.closed.try_recv().is_ok());
        assert!(h.stub.is_closed());
        assert!(!h.stub.close().await);

        // 센티널 뒤의 청크는 읽지 않음
        let remaining = h.stub.input.try_recv().unwrap().unwrap();
        assert_eq!(&remaining.data[..], b"after end");

        assert_eq!(h.output.recv().await.flatten().map(|c| c.data), Some(Bytes::from("first")));
        assert_eq!(h.output.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_interrupt_does_not_consume_pending_chunk() {
        let mut h = harness();
        send(&h, b"HTTP/1.1 204 No Content\r\n\r\n").await;
        h.control.interrupt.send(()).await.unwrap();

        let exit = toxic().pipe(&mut h.stub).await;
        assert_eq!(exit, PipeExit::Interrupted);

        assert!(!h.stub.is_closed());
        assert!(h.control.closed.try_recv().is_err());
        assert!(h.output.try_recv().is_err());

        let pending = h.stub.input.try_recv().unwrap().unwrap();
        assert_eq!(&pending.data[..], b"HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[tokio::test]
    async fn test_interrupt_while_waiting_for_input() {
        let Harness {
            mut stub,
            control,
            input,
            mut output,
        } = harness();

        let task = tokio::spawn(async move {
            let exit = toxic().pipe(&mut stub).await;
            (stub, exit)
        });

        input.send(Some(StreamChunk::new("hello"))).await.unwrap();
        let chunk = output.recv().await.flatten().unwrap();
        assert_eq!(&chunk.data[..], b"hello");

        control.interrupt.send(()).await.unwrap();
        let (stub, exit) = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("인터럽트 후 파이프가 끝나야 함")
            .unwrap();

        assert_eq!(exit, PipeExit::Interrupted);
        assert!(!stub.is_closed());
    }

    #[tokio::test]
    async fn test_resumes_after_interrupt() {
        // 인터럽트 후 같은 스텁으로 다시 파이프를 시작할 수 있음
        let mut h = harness();
        h.control.interrupt.send(()).await.unwrap();
        assert_eq!(toxic().pipe(&mut h.stub).await, PipeExit::Interrupted);

        send(&h, b"HTTP/1.0 200 OK\r\n\r\nraw body").await;
        h.input.send(None).await.unwrap();
        assert_eq!(toxic().pipe(&mut h.stub).await, PipeExit::Closed);

        let chunk = h.output.recv().await.flatten().unwrap();
        assert!(chunk.data.starts_with(b"HTTP/1.0 502 Bad Gateway\r\n"));
        assert!(chunk.data.ends_with(b"\r\n\r\nbad gateway"));
    }

    #[tokio::test]
    async fn test_order_preserved_under_backpressure() {
        let (input, input_rx) = mpsc::channel(1);
        let (output_tx, mut output) = mpsc::channel(1);
        let (mut stub, _control) = ToxicStub::new(input_rx, output_tx);

        let task = tokio::spawn(async move { toxic().pipe(&mut stub).await });

        let producer = tokio::spawn(async move {
            for i in 0..20 {
                let data = if i % 2 == 0 {
                    Bytes::from_static(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")
                } else {
                    Bytes::from(format!("plain-{}", i))
                };
                input.send(Some(StreamChunk::new(data))).await.unwrap();
            }
            input.send(None).await.unwrap();
        });

        let mut received = Vec::new();
        while let Some(Some(chunk)) = output.recv().await {
            tokio::time::sleep(Duration::from_millis(1)).await;
            received.push(chunk.data);
        }

        producer.await.unwrap();
        assert_eq!(task.await.unwrap(), PipeExit::Closed);

        assert_eq!(received.len(), 20);
        for (i, data) in received.iter().enumerate() {
            if i % 2 == 0 {
                assert!(data.starts_with(b"HTTP/1.1 502 Bad Gateway\r\n"));
            } else {
                assert_eq!(data, &Bytes::from(format!("plain-{}", i)));
            }
        }
    }

    #[tokio::test]
    async fn test_rewritten_output_is_stable() {
        let toxic = toxic();
        let mut h = harness();
        send(&h, b"HTTP/1.1 301 Moved Permanently\r\nLocation: /new\r\nContent-Length: 0\r\n\r\n").await;
        h.input.send(None).await.unwrap();
        toxic.pipe(&mut h.stub).await;
        let first = h.output.recv().await.flatten().unwrap().data;

        let mut h = harness();
        h.input.send(Some(StreamChunk::new(first.clone()))).await.unwrap();
        h.input.send(None).await.unwrap();
        toxic.pipe(&mut h.stub).await;
        let second = h.output.recv().await.flatten().unwrap().data;

        assert_eq!(first, second);
    }
}
