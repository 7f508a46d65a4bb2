use crate::models::Record;

/// Reconcile `state` with `update` in place.
///
/// Every field of `update` is written into `state` and every field of `state` missing
/// from `update` is removed. Fields already present keep their position, so holders of
/// `state` observe field-level changes instead of a replaced record.
pub fn update_state(state: &Record, update: &Record) {
    // Copy first: `state` and `update` may share storage
    let incoming = update.fields();
    let mut target = state.fields_mut();

    target.retain(|key, _| incoming.contains_key(key));
    for (key, value) in incoming {
        target.insert(key, value);
    }
}
