use crate::config::CodecConfig;
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::request::RmcRequest;
use crate::protocol::response::RmcResponse;
use crate::utils::compression::{maybe_compress, CompressionAlgorithm};
use crate::utils::metrics::{global_metrics, Metrics, Timer};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Carries RMC envelopes in and out of PRUDP payloads.
///
/// Each pipeline owns its own compression instance. Metrics may be shared.
#[derive(Debug)]
pub struct RmcPipeline {
    compression: Box<dyn CompressionAlgorithm>,
    threshold_bytes: usize,
    metrics: Arc<Metrics>,
}

impl RmcPipeline {
    pub fn new(compression: &dyn CompressionAlgorithm, threshold_bytes: usize) -> Self {
        Self {
            compression: compression.duplicate(),
            threshold_bytes,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Build from configuration, recording into the process-global metrics
    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            compression: config.build_algorithm(),
            threshold_bytes: config.compression_threshold_bytes,
            metrics: global_metrics(),
        }
    }

    /// Record into `metrics` instead of a private instance
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn compression(&self) -> &dyn CompressionAlgorithm {
        self.compression.as_ref()
    }

    /// Decode a raw datagram, counting the outcome
    pub fn decode_packet(&self, datagram: &[u8]) -> Result<Packet> {
        match Packet::from_bytes(datagram) {
            Ok(packet) => {
                self.metrics.packet_decoded();
                Ok(packet)
            }
            Err(e) => {
                self.metrics.decode_error();
                debug!(error = %e, len = datagram.len(), "Dropping malformed datagram");
                Err(e)
            }
        }
    }

    /// Decompress a packet payload and decode the request inside it
    #[instrument(level = "trace", skip_all, fields(seq = packet.sequence_id))]
    pub fn decode_request(&self, packet: &Packet) -> Result<RmcRequest> {
        let _timer = Timer::start("decode_request");

        let payload = self.compression.decompress(&packet.payload).map_err(|e| {
            match &e {
                ProtocolError::RatioMismatch { .. } => self.metrics.ratio_mismatch(),
                _ => self.metrics.decompression_failure(),
            }
            warn!(
                error = %e,
                session_id = packet.session_id,
                sequence_id = packet.sequence_id,
                "Failed to decompress payload"
            );
            e
        })?;

        let request = RmcRequest::from_bytes(&payload).map_err(|e| {
            self.metrics.decode_error();
            e
        })?;

        self.metrics.request_decoded(packet.payload.len() as u64);
        Ok(request)
    }

    /// Serialize and compress a response into a payload for the transport
    pub fn encode_response(&self, response: &RmcResponse) -> Result<Vec<u8>> {
        let _timer = Timer::start("encode_response");

        response.try_size()?;
        let envelope = response.to_bytes();
        let (payload, applied) =
            maybe_compress(self.compression.as_ref(), &envelope, self.threshold_bytes)?;

        self.metrics.compression_attempt(applied);
        self.metrics.response_encoded(payload.len() as u64);
        debug!(
            envelope_len = envelope.len(),
            payload_len = payload.len(),
            compressed = applied,
            "Encoded RMC response"
        );
        Ok(payload)
    }

    /// Decode, dispatch and encode one request packet
    pub fn handle(&self, packet: &Packet, dispatcher: &Dispatcher) -> Result<Vec<u8>> {
        let request = self.decode_request(packet)?;
        let response = dispatcher.dispatch(&request)?;
        self.encode_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::compression::{DeflateCompression, Lz4Compression, NoCompression};

    fn datagram(payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; 28];
        buf[6] = 0x02;
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(payload);
        buf.push(0);
        buf
    }

    fn request(call_id: u32, method_id: u32, parameters: &[u8]) -> Vec<u8> {
        let mut buf = 26u32.to_le_bytes().to_vec();
        buf.push(0x80 | 0x0A);
        buf.extend_from_slice(&call_id.to_le_bytes());
        buf.extend_from_slice(&method_id.to_le_bytes());
        buf.extend_from_slice(parameters);
        buf
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_roundtrip_through_each_strategy() {
        let strategies: Vec<Box<dyn CompressionAlgorithm>> = vec![
            Box::new(NoCompression),
            Box::new(DeflateCompression::new()),
            Box::new(Lz4Compression::new()),
        ];
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(0x0A, 1, |req| Ok(req.parameters.repeat(8)))
            .unwrap();

        for strategy in strategies {
            let pipeline = RmcPipeline::new(strategy.as_ref(), 0);
            let payload = strategy.compress(&request(9, 1, b"abcdefgh")).unwrap();
            let packet = pipeline.decode_packet(&datagram(&payload)).unwrap();

            let out = pipeline.handle(&packet, &dispatcher).unwrap();
            let response = RmcResponse::from_bytes(&strategy.decompress(&out).unwrap()).unwrap();
            assert!(response.is_success());
            assert_eq!(response.body().call_id(), 9);

            let snapshot = pipeline.metrics().snapshot();
            assert_eq!(snapshot.packets_decoded, 1);
            assert_eq!(snapshot.requests_decoded, 1);
            assert_eq!(snapshot.responses_encoded, 1);
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_small_responses_framed_raw() {
        let pipeline = RmcPipeline::new(&DeflateCompression::new(), 64);
        let response = RmcResponse::success(0x0A, 1, 1, vec![1, 2]);
        let out = pipeline.encode_response(&response).unwrap();
        assert_eq!(out[0], 0);
        assert_eq!(&out[1..], &response.to_bytes()[..]);
        assert_eq!(pipeline.metrics().snapshot().compression_applied, 0);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_ratio_mismatch_counted() {
        let codec = DeflateCompression::new();
        let pipeline = RmcPipeline::new(&codec, 0);
        let mut payload = codec.compress(&request(1, 1, &[0u8; 400])).unwrap();
        payload[0] = payload[0].wrapping_add(1).max(1);
        let packet = pipeline.decode_packet(&datagram(&payload)).unwrap();

        let err = pipeline.decode_request(&packet).unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(pipeline.metrics().snapshot().ratio_mismatches, 1);
    }

    #[test]
    fn test_malformed_datagram_counted() {
        let pipeline = RmcPipeline::new(&NoCompression, 0);
        assert!(pipeline.decode_packet(&[0u8; 10]).is_err());
        assert_eq!(pipeline.metrics().snapshot().decode_errors, 1);
    }

    #[test]
    fn test_configured_pipelines_use_global_metrics() {
        let a = RmcPipeline::from_config(&CodecConfig::default());
        let b = RmcPipeline::from_config(&CodecConfig::default());
        assert!(Arc::ptr_eq(a.metrics(), b.metrics()));
        assert!(Arc::ptr_eq(a.metrics(), &global_metrics()));

        let private = RmcPipeline::new(&NoCompression, 0);
        assert!(!Arc::ptr_eq(private.metrics(), &global_metrics()));
    }

    #[test]
    fn test_shared_metrics() {
        let metrics = Arc::new(Metrics::new());
        let a = RmcPipeline::new(&NoCompression, 0).with_metrics(metrics.clone());
        let b = RmcPipeline::from_config(&CodecConfig::default()).with_metrics(metrics.clone());
        let _ = a.decode_packet(&[]);
        let _ = b.decode_packet(&[]);
        assert_eq!(metrics.snapshot().decode_errors, 2);
    }
}
