//! Wire types for the logship access-log streaming service.
//!
//! This crate is the **infrastructure layer** for the gRPC message types of
//! `logship.v1.AccessLogService` and the client surface of its
//! `BufferedCriticalLogs` bidirectional streaming method.
//!
//! The message structs are maintained by hand with `prost` derives (explicit
//! field tags, stable across releases) so the build carries no protoc step;
//! the client module follows the tonic codegen layout. Only the client half
//! of the service lives here — this workspace ships logs, it never serves
//! them.

/// Node identity of the proxy instance emitting logs.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    /// Opaque instance id, typically the hostname.
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    /// Deployment cluster the instance belongs to.
    #[prost(string, tag = "2")]
    pub cluster: ::prost::alloc::string::String,
}

/// One-time stream identifier, stamped on the first message after a stream
/// opens and absent from every message that follows.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogIdentifier {
    #[prost(message, optional, tag = "1")]
    pub node: ::core::option::Option<Node>,
    /// Logical log this stream feeds, as configured on the sender.
    #[prost(string, tag = "2")]
    pub log_name: ::prost::alloc::string::String,
}

/// A single HTTP access-log record. The receiving collector owns the
/// semantics of these fields; the shipping subsystem treats them as opaque.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpLogEntry {
    #[prost(message, optional, tag = "1")]
    pub timestamp: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(string, tag = "2")]
    pub method: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub path: ::prost::alloc::string::String,
    #[prost(uint32, tag = "4")]
    pub response_code: u32,
    #[prost(uint64, tag = "5")]
    pub bytes_sent: u64,
    #[prost(uint64, tag = "6")]
    pub bytes_received: u64,
}

/// A single TCP access-log record.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TcpLogEntry {
    #[prost(message, optional, tag = "1")]
    pub timestamp: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(uint64, tag = "2")]
    pub bytes_sent: u64,
    #[prost(uint64, tag = "3")]
    pub bytes_received: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpLogEntries {
    #[prost(message, repeated, tag = "1")]
    pub log_entry: ::prost::alloc::vec::Vec<HttpLogEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TcpLogEntries {
    #[prost(message, repeated, tag = "1")]
    pub log_entry: ::prost::alloc::vec::Vec<TcpLogEntry>,
}

/// Composite request carrying a batch of log entries.
///
/// `id` is a content fingerprint computed by the sender over the serialized
/// message with `id` still zero, then written into this field. The receiver
/// echoes it back in [`CriticalLogsResponse`].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CriticalLogsMessage {
    #[prost(message, optional, tag = "1")]
    pub identifier: ::core::option::Option<LogIdentifier>,
    #[prost(uint32, tag = "2")]
    pub id: u32,
    #[prost(oneof = "critical_logs_message::LogEntries", tags = "3, 4")]
    pub log_entries: ::core::option::Option<critical_logs_message::LogEntries>,
}

/// Nested message and enum types in `CriticalLogsMessage`.
pub mod critical_logs_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum LogEntries {
        #[prost(message, tag = "3")]
        HttpLogs(super::HttpLogEntries),
        #[prost(message, tag = "4")]
        TcpLogs(super::TcpLogEntries),
    }
}

/// Per-message acknowledgement from the collector.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CriticalLogsResponse {
    /// Fingerprint of the message being acknowledged.
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(enumeration = "critical_logs_response::Status", tag = "2")]
    pub status: i32,
}

/// Nested message and enum types in `CriticalLogsResponse`.
pub mod critical_logs_response {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Status {
        Unspecified = 0,
        /// The collector durably accepted the message.
        Ack = 1,
        /// The collector rejected the message; the sender should retry.
        Nack = 2,
    }

    impl Status {
        /// String value of the enum field name used in the ProtoBuf
        /// definition.
        pub fn as_str_name(&self) -> &'static str {
            match self {
                Self::Unspecified => "UNSPECIFIED",
                Self::Ack => "ACK",
                Self::Nack => "NACK",
            }
        }
    }
}

/// Generated client implementations.
pub mod access_log_service_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::wildcard_imports)]
    use tonic::codegen::http::Uri;
    use tonic::codegen::*;

    /// Client for the access-log streaming service.
    #[derive(Debug, Clone)]
    pub struct AccessLogServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl AccessLogServiceClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> AccessLogServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::Body>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub fn with_origin(inner: T, origin: Uri) -> Self {
            let inner = tonic::client::Grpc::with_origin(inner, origin);
            Self { inner }
        }

        /// Limits the maximum size of a decoded message.
        ///
        /// Default: `4MB`
        #[must_use]
        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }

        /// Limits the maximum size of an encoded message.
        ///
        /// Default: `usize::MAX`
        #[must_use]
        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }

        /// Ship critical log batches and receive per-message
        /// acknowledgements over one bidirectional stream.
        pub async fn buffered_critical_logs(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::CriticalLogsMessage>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::CriticalLogsResponse>>,
            tonic::Status,
        > {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/logship.v1.AccessLogService/BufferedCriticalLogs",
            );
            let mut req = request.into_streaming_request();
            req.extensions_mut().insert(GrpcMethod::new(
                "logship.v1.AccessLogService",
                "BufferedCriticalLogs",
            ));
            self.inner.streaming(req, path, codec).await
        }
    }
}
