use actix::prelude::*;
use async_trait::async_trait;
use tracing::Span;

/// Message with span used for trace logging
pub struct SpanMessage<I> {
    pub msg: I,
    pub span: Span,
}

impl<M> SpanMessage<M> {
    pub fn new(msg: M) -> Self {
        Self {
            msg,
            span: Span::current(),
        }
    }
}

impl<M, R: 'static> Message for SpanMessage<M>
where
    M: Message<Result = R>,
{
    type Result = R;
}

/// Async handler for a [`SpanMessage`] wrapped message.
///
/// Handlers are written as free async functions and reach the actor state
/// through `actix_interop::with_ctx`. The wrapping span is entered before the
/// future is polled, so trace context survives the mailbox hop.
#[async_trait(?Send)]
pub trait AsyncSpanHandler<M>
where
    Self: Actor,
    M: Message,
{
    async fn handle(msg: M) -> <M as Message>::Result;
}

// Expansions lean on the invoking module's imports: `Handler` and friends
// from the actix prelude, `FutureInterop` and `Instrument` for the method
// calls on the returned future.
#[macro_export]
macro_rules! span_message_async_impl {
    ($message_type:ident, $actor:ident) => {
        impl Handler<crate::span::SpanMessage<$message_type>> for $actor {
            type Result = ResponseActFuture<Self, <$message_type as Message>::Result>;
            fn handle(
                &mut self,
                msg: crate::span::SpanMessage<$message_type>,
                _ctx: &mut Context<Self>,
            ) -> Self::Result {
                let crate::span::SpanMessage { span, msg } = msg;
                let _enter = span.enter();
                <Self as AsyncSpanHandler<$message_type>>::handle(msg)
                    .in_current_span()
                    .interop_actor_boxed(self)
            }
        }
    };
}

#[macro_export]
macro_rules! async_message_handler_with_span {
    ({ impl AsyncSpanHandler<$M:ident> for $A:ident $t:tt }) => {
        crate::span_message_async_impl!($M, $A);
        #[async_trait::async_trait(?Send)]
        impl AsyncSpanHandler<$M> for $A
            $t
    };
}
