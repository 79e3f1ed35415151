// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Native callbacks dispatched to Rust closures.
//!
//! Two shapes are bridged:
//!
//! - **Bus watches** outlive the registering call. The closure is stored in a
//!   process-wide table under a [`UserDataToken`]; the native side only ever
//!   sees the token. [`BusWatch`] owns the registration.
//! - **Structure field folds** are synchronous. The closure lives on the
//!   caller's stack for the duration of the native call.
//!
//! Panics raised by a closure never unwind into native frames.

use std::{
    collections::HashMap,
    ffi::c_void,
    ops::ControlFlow,
    panic::{AssertUnwindSafe, catch_unwind, resume_unwind},
    ptr::NonNull,
    sync::{
        Arc, LazyLock, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use gstbridge_sys as ffi;
use tracing::{debug, error, trace, warn};

use crate::{
    Error, Handle, Result, TypeRegistry, TypedView,
    api::{cstr_to_string, take_gstring},
    kind::{self, NativeKind},
};

/// Correlates a native callback invocation with a registered closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserDataToken(u64);

impl UserDataToken {
    pub fn as_ptr(self) -> ffi::gpointer {
        std::ptr::without_provenance_mut(self.0 as usize)
    }

    pub fn from_ptr(ptr: ffi::gpointer) -> Self {
        Self(ptr.addr() as u64)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Closure invoked for every message delivered by a bus watch.
///
/// Returning [`ControlFlow::Break`] removes the watch.
pub type BusHandler =
    Box<dyn FnMut(&TypedView<'_, kind::Bus>, &TypedView<'_, kind::Message>) -> ControlFlow<()> + Send>;

struct WatchEntry {
    registry: TypeRegistry,
    handler: Mutex<BusHandler>,
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

static WATCHES: LazyLock<Mutex<HashMap<u64, Arc<WatchEntry>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn watches() -> MutexGuard<'static, HashMap<u64, Arc<WatchEntry>>> {
    WATCHES.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stores `handler` and returns the token to hand to the native side.
pub fn register_bus_handler(registry: &TypeRegistry, handler: BusHandler) -> UserDataToken {
    let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    watches().insert(
        token,
        Arc::new(WatchEntry {
            registry: registry.clone(),
            handler: Mutex::new(handler),
        }),
    );
    trace!("Registered bus handler {}", token);
    UserDataToken(token)
}

/// Forgets the closure behind `token`. Returns `false` if it was unknown.
///
/// Invocations already running complete normally.
pub fn unregister(token: UserDataToken) -> bool {
    let removed = watches().remove(&token.0).is_some();
    trace!("Unregistered bus handler {}: {}", token.0, removed);
    removed
}

/// Returns `true` while a closure is registered under `token`.
pub fn is_registered(token: UserDataToken) -> bool {
    watches().contains_key(&token.0)
}

/// `GstBusFunc` dispatching to the closure registered under `user_data`.
///
/// Returns `FALSE` (which removes the native watch) when the closure breaks,
/// the token is unknown, a handle fails to cast, or the closure panics.
///
/// # Safety
///
/// `bus` and `message` must be null or live objects for the duration of the
/// call.
pub unsafe extern "C" fn bus_watch_trampoline(
    bus: *mut ffi::GstBus,
    message: *mut ffi::GstMessage,
    user_data: ffi::gpointer,
) -> ffi::gboolean {
    let token = UserDataToken::from_ptr(user_data);
    let Some(entry) = watches().get(&token.0).cloned() else {
        warn!("Bus message for unknown token {}", token.0);
        return ffi::GFALSE;
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let registry = &entry.registry;
        let bus = unsafe { Handle::instance(bus) }.ok_or(Error::InvalidHandle)?;
        let message = unsafe { Handle::mini_object(message) }.ok_or(Error::InvalidHandle)?;
        let bus = registry.cast::<kind::Bus>(&bus)?;
        let message = registry.cast::<kind::Message>(&message)?;
        let mut handler = entry
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok::<_, Error>((&mut **handler)(&bus, &message))
    }));

    match outcome {
        Ok(Ok(ControlFlow::Continue(()))) => ffi::GTRUE,
        Ok(Ok(ControlFlow::Break(()))) => {
            debug!("Bus handler {} requested removal", token.0);
            ffi::GFALSE
        }
        Ok(Err(error)) => {
            warn!("Dropping bus message for token {}: {}", token.0, error);
            ffi::GFALSE
        }
        Err(_) => {
            error!("Bus handler {} panicked", token.0);
            ffi::GFALSE
        }
    }
}

/// An installed bus watch.
///
/// Holds a reference to the bus. Dropping the guard (or calling
/// [`BusWatch::remove`]) removes the native watch and releases the closure.
pub struct BusWatch {
    registry: TypeRegistry,
    bus: NonNull<ffi::GstBus>,
    token: UserDataToken,
    source_id: u32,
    removed: bool,
}

/// Safety: the bus is reference counted atomically and only used through
/// thread-safe native calls.
unsafe impl Send for BusWatch {}

impl BusWatch {
    /// Installs `handler` as the watch of `bus`.
    ///
    /// # Errors
    ///
    /// [`Error::Other`] if the bus already has a watch.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::ops::ControlFlow;
    /// # use gstbridge::{BusWatch, TypedView, kind::Bus};
    /// # fn example(bus: &TypedView<'_, Bus>) -> gstbridge::Result<()> {
    /// let watch = BusWatch::add(bus, |_bus, message| {
    ///     println!("{:?}", message.message_type());
    ///     ControlFlow::Continue(())
    /// })?;
    /// // ...
    /// watch.remove();
    /// # Ok(())
    /// # }
    /// ```
    pub fn add<F>(bus: &TypedView<'_, kind::Bus>, handler: F) -> Result<Self>
    where
        F: FnMut(&TypedView<'_, kind::Bus>, &TypedView<'_, kind::Message>) -> ControlFlow<()>
            + Send
            + 'static,
    {
        let registry = bus.registry().clone();
        let api = registry.api().clone();
        let token = register_bus_handler(&registry, Box::new(handler));

        let bus_ptr = bus.handle().as_non_null().cast::<ffi::GstBus>();
        unsafe { api.gst_object_ref(bus_ptr.as_ptr().cast()) };
        let source_id = unsafe {
            api.gst_bus_add_watch_full(
                bus_ptr.as_ptr(),
                ffi::G_PRIORITY_DEFAULT,
                bus_watch_trampoline,
                token.as_ptr(),
                None,
            )
        };
        if source_id == 0 {
            unregister(token);
            unsafe { api.gst_object_unref(bus_ptr.as_ptr().cast()) };
            return Err(Error::Other(format!(
                "Bus {} already has a watch",
                bus.name().unwrap_or_default()
            )));
        }

        debug!("Installed bus watch {} (source {})", token.0, source_id);
        Ok(Self {
            registry,
            bus: bus_ptr,
            token,
            source_id,
            removed: false,
        })
    }

    pub fn token(&self) -> UserDataToken {
        self.token
    }

    /// Native event source id.
    pub fn source_id(&self) -> u32 {
        self.source_id
    }

    /// Removes the watch and releases the closure and the bus.
    pub fn remove(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        let api = self.registry.api();
        if unsafe { api.gst_bus_remove_watch(self.bus.as_ptr()) } == ffi::GFALSE {
            // Already gone natively, e.g. after the handler returned `Break`.
            debug!("Bus watch {} was already removed", self.token.0);
        }
        unregister(self.token);
        unsafe { api.gst_object_unref(self.bus.as_ptr().cast()) };
    }
}

impl Drop for BusWatch {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for BusWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusWatch")
            .field("token", &self.token)
            .field("source_id", &self.source_id)
            .finish()
    }
}

bitflags::bitflags! {
    /// Message types (`GstMessageType`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MessageType: u32 {
        const EOS = ffi::GST_MESSAGE_EOS;
        const ERROR = ffi::GST_MESSAGE_ERROR;
        const WARNING = ffi::GST_MESSAGE_WARNING;
        const INFO = ffi::GST_MESSAGE_INFO;
        const TAG = ffi::GST_MESSAGE_TAG;
        const BUFFERING = ffi::GST_MESSAGE_BUFFERING;
        const STATE_CHANGED = ffi::GST_MESSAGE_STATE_CHANGED;
        const STATE_DIRTY = ffi::GST_MESSAGE_STATE_DIRTY;
        const STEP_DONE = ffi::GST_MESSAGE_STEP_DONE;
        const CLOCK_PROVIDE = ffi::GST_MESSAGE_CLOCK_PROVIDE;
        const CLOCK_LOST = ffi::GST_MESSAGE_CLOCK_LOST;
        const NEW_CLOCK = ffi::GST_MESSAGE_NEW_CLOCK;
        const STRUCTURE_CHANGE = ffi::GST_MESSAGE_STRUCTURE_CHANGE;
        const STREAM_STATUS = ffi::GST_MESSAGE_STREAM_STATUS;
        const APPLICATION = ffi::GST_MESSAGE_APPLICATION;
        const ELEMENT = ffi::GST_MESSAGE_ELEMENT;
        const SEGMENT_START = ffi::GST_MESSAGE_SEGMENT_START;
        const SEGMENT_DONE = ffi::GST_MESSAGE_SEGMENT_DONE;
        const DURATION_CHANGED = ffi::GST_MESSAGE_DURATION_CHANGED;
        const LATENCY = ffi::GST_MESSAGE_LATENCY;
        const ASYNC_START = ffi::GST_MESSAGE_ASYNC_START;
        const ASYNC_DONE = ffi::GST_MESSAGE_ASYNC_DONE;
        const REQUEST_STATE = ffi::GST_MESSAGE_REQUEST_STATE;
        const STEP_START = ffi::GST_MESSAGE_STEP_START;
        const QOS = ffi::GST_MESSAGE_QOS;
        const PROGRESS = ffi::GST_MESSAGE_PROGRESS;
        const TOC = ffi::GST_MESSAGE_TOC;
        const RESET_TIME = ffi::GST_MESSAGE_RESET_TIME;
        const STREAM_START = ffi::GST_MESSAGE_STREAM_START;
        const NEED_CONTEXT = ffi::GST_MESSAGE_NEED_CONTEXT;
        const HAVE_CONTEXT = ffi::GST_MESSAGE_HAVE_CONTEXT;
    }
}

impl TypedView<'_, kind::Message> {
    fn message(&self) -> &ffi::GstMessage {
        unsafe { &*self.as_ptr() }
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from_bits_retain(self.message().type_)
    }

    pub fn seqnum(&self) -> u32 {
        self.message().seqnum
    }

    /// Name of the object that posted the message.
    pub fn src_name(&self) -> Option<String> {
        let src = self.message().src;
        if src.is_null() {
            return None;
        }
        let api = self.registry().api();
        unsafe { take_gstring(api, api.gst_object_get_name(src)) }
    }
}

/// One field visited by [`TypedView::fold_fields`].
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    registry: &'a TypeRegistry,
    id: ffi::GQuark,
    value: ValueRef<'a>,
}

impl<'a> FieldRef<'a> {
    pub fn id(&self) -> ffi::GQuark {
        self.id
    }

    pub fn name(&self) -> Option<String> {
        unsafe { cstr_to_string(self.registry.api().g_quark_to_string(self.id)) }
    }

    pub fn value(&self) -> ValueRef<'a> {
        self.value
    }
}

/// A borrowed `GValue`.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    registry: &'a TypeRegistry,
    value: NonNull<ffi::GValue>,
}

impl<'a> ValueRef<'a> {
    pub fn type_tag(&self) -> ffi::GType {
        unsafe { self.value.as_ref() }.g_type
    }

    pub fn type_name(&self) -> String {
        self.registry.type_name(self.type_tag())
    }

    /// Human-readable rendering of the value.
    pub fn contents(&self) -> Option<String> {
        let api = self.registry.api();
        unsafe { take_gstring(api, api.g_strdup_value_contents(self.value.as_ptr())) }
    }

    /// Handle to the boxed object held by the value.
    ///
    /// Mini objects (a buffer, a sample, ...) come back with
    /// [`crate::Layout::MiniObject`], nested structures and caps features with
    /// [`crate::Layout::Boxed`]. Returns `Ok(None)` for an empty value.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if the value holds neither.
    pub fn boxed_handle(&self) -> Result<Option<Handle>> {
        let tag = self.type_tag();
        let Some(layout) = self.registry.value_layout(tag) else {
            return Err(Error::TypeMismatch {
                expected: "GstMiniObject or boxed structure",
                actual: self.type_name(),
            });
        };
        let boxed = unsafe { self.registry.api().g_value_get_boxed(self.value.as_ptr()) };
        Ok(unsafe { Handle::from_raw(boxed, layout) })
    }

    /// Casts the boxed object held by the value to `K`.
    pub fn get<K: NativeKind>(&self) -> Result<Option<TypedView<'a, K>>> {
        self.boxed_handle()?
            .map(|handle| self.registry.cast::<K>(&handle))
            .transpose()
    }
}

impl std::fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueRef")
            .field("type", &self.type_name())
            .finish_non_exhaustive()
    }
}

struct FoldState<'r, F> {
    registry: &'r TypeRegistry,
    func: F,
    panic: Option<Box<dyn std::any::Any + Send>>,
}

unsafe extern "C" fn field_fold_trampoline<F>(
    field_id: ffi::GQuark,
    value: *const ffi::GValue,
    user_data: ffi::gpointer,
) -> ffi::gboolean
where
    F: FnMut(FieldRef<'_>) -> ControlFlow<()>,
{
    let state = unsafe { &mut *user_data.cast::<FoldState<'_, F>>() };
    let Some(value) = NonNull::new(value.cast_mut()) else {
        return ffi::GTRUE;
    };
    let field = FieldRef {
        registry: state.registry,
        id: field_id,
        value: ValueRef {
            registry: state.registry,
            value,
        },
    };

    match catch_unwind(AssertUnwindSafe(|| (state.func)(field))) {
        Ok(ControlFlow::Continue(())) => ffi::GTRUE,
        Ok(ControlFlow::Break(())) => ffi::GFALSE,
        Err(payload) => {
            state.panic = Some(payload);
            ffi::GFALSE
        }
    }
}

impl<'a> TypedView<'a, kind::Structure> {
    /// The structure's name.
    pub fn name(&self) -> Option<String> {
        let quark = unsafe { (*self.as_ptr()).name };
        unsafe { cstr_to_string(self.registry().api().g_quark_to_string(quark)) }
    }

    /// Visits every field in order until `func` breaks.
    ///
    /// Returns `true` if all fields were visited. A panic in `func` stops the
    /// walk and is resumed once the native call has returned.
    pub fn fold_fields<F>(&self, func: F) -> bool
    where
        F: FnMut(FieldRef<'_>) -> ControlFlow<()>,
    {
        let mut state = FoldState {
            registry: self.registry(),
            func,
            panic: None,
        };
        let completed = unsafe {
            self.registry().api().gst_structure_foreach(
                self.as_ptr(),
                field_fold_trampoline::<F>,
                (&raw mut state).cast::<c_void>(),
            )
        };
        if let Some(payload) = state.panic.take() {
            resume_unwind(payload);
        }
        completed != ffi::GFALSE
    }

    /// Names of all fields in order.
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.fold_fields(|field| {
            names.extend(field.name());
            ControlFlow::Continue(())
        });
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_through_pointer() {
        let token = UserDataToken(42);
        assert_eq!(UserDataToken::from_ptr(token.as_ptr()), token);
        assert_eq!(token.get(), 42);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let token = UserDataToken(u64::MAX - 1);
        assert!(!is_registered(token));
        assert!(!unregister(token));
        let result = unsafe {
            bus_watch_trampoline(std::ptr::null_mut(), std::ptr::null_mut(), token.as_ptr())
        };
        assert_eq!(result, ffi::GFALSE);
    }

    #[test]
    fn watch_guard_can_move_across_threads() {
        fn is_send<T: Send>() {}
        fn is_sync<T: Sync>() {}
        is_send::<BusWatch>();
        is_send::<TypeRegistry>();
        is_sync::<TypeRegistry>();
    }
}
