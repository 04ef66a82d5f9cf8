/// Generates a request/response method on a channel-backed client.
///
/// The method builds the request variant with a fresh oneshot, sends it and
/// awaits the answer. A closed or dropped actor becomes
/// `ActorCommunicationError` of the method's error type.
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident, Error = $error_type:ty) => {
        impl $client {
            #[tracing::instrument(skip_all)]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $error_type> {
                tracing::debug!("Sending request");
                let (respond_to, response) = tokio::sync::oneshot::channel();
                self.sender.send($request::$variant {
                    $($param,)*
                    respond_to,
                }).await.map_err(|_| <$error_type>::ActorCommunicationError("Actor closed".to_string()))?;

                response.await.map_err(|_| <$error_type>::ActorCommunicationError("Actor dropped".to_string()))?
            }
        }
    };
}

/// Declares a cloneable client around an mpsc sender, with `new` and a
/// `shutdown` that asks the service loop to stop.
macro_rules! actor_client {
    ($(#[$meta:meta])* $client:ident, $request:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $client {
            sender: tokio::sync::mpsc::Sender<$request>,
        }

        impl $client {
            pub fn new(sender: tokio::sync::mpsc::Sender<$request>) -> Self {
                Self { sender }
            }

            pub async fn shutdown(&self) -> Result<(), String> {
                self.sender
                    .send($request::Shutdown)
                    .await
                    .map_err(|e| format!("Failed to send shutdown: {e}"))
            }
        }
    };
}
