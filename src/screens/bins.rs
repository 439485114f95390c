//! Bin list with live status, and the bin forms.

use tracing::debug;

use super::{announce, ScreenLifecycle};
use crate::api::{ApiError, BinColor, BinFields, BinRecord, MessageReply};
use crate::bin_status::{BinStatusComponent, DeleteOutcome};
use crate::context::AppContext;
use crate::forms::{
    submit_validated, FormSchema, FormValues, SubmitOutcome, CREATE_BIN_FORM, EDIT_BIN_FORM,
};
use crate::navigation::Route;

pub const BINS_FAILURE: &str = "Error fetching bins. Please try again.";
pub const BIN_FETCH_FAILURE: &str = "Error fetching bin data";
pub const BIN_CREATE_FAILURE: &str = "Error creating bin";
pub const BIN_UPDATE_FAILURE: &str = "Error updating bin";

fn bin_fields(values: &FormValues) -> Result<BinFields, ApiError> {
    let bin_color = BinColor::from_str(values.get("binColor")).ok_or_else(|| {
        ApiError::InvalidInput(format!("unknown bin color '{}'", values.get("binColor")))
    })?;
    Ok(BinFields {
        bin_name: values.trimmed("binName"),
        bin_location: values.trimmed("binLocation"),
        bin_color,
    })
}

/// One listed bin and its live status.
#[derive(Debug)]
pub struct BinEntry {
    pub record: BinRecord,
    pub status: BinStatusComponent,
}

/// The bin list. Each listed bin keeps a status component mounted until the
/// bin is removed or the screen is left.
pub struct BinsScreen {
    ctx: AppContext,
    lifecycle: ScreenLifecycle,
    entries: Vec<BinEntry>,
}

impl BinsScreen {
    pub fn open(ctx: &AppContext) -> Result<Self, Route> {
        let lifecycle = ScreenLifecycle::enter(ctx, Route::Bins)?;
        Ok(Self {
            ctx: ctx.clone(),
            lifecycle,
            entries: Vec::new(),
        })
    }

    /// Fetches the list and mounts a status component per bin.
    pub async fn load(&mut self) -> bool {
        let Some(result) = self.lifecycle.run(self.ctx.api.list_bins()).await else {
            return false;
        };
        match result {
            Ok(reply) => {
                let telemetry = &self.ctx.telemetry;
                self.entries = reply
                    .data
                    .into_iter()
                    .map(|record| {
                        let status = BinStatusComponent::mount(
                            &record.id,
                            telemetry.feed.as_ref(),
                            &telemetry.channel,
                            telemetry.capacity_cm,
                        );
                        BinEntry { record, status }
                    })
                    .collect();
                debug!("Mounted {} bin displays", self.entries.len());
                if !reply.message.trim().is_empty() {
                    self.ctx.notifier.success(reply.message);
                }
                true
            }
            Err(e) => {
                self.ctx.report(&e, BINS_FAILURE);
                false
            }
        }
    }

    pub fn entries(&self) -> &[BinEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&BinEntry> {
        self.entries.iter().find(|e| e.record.id == id)
    }

    pub fn request_edit(&self, id: &str) -> bool {
        match self.entry(id) {
            Some(entry) => {
                entry.status.request_edit(self.ctx.navigator());
                true
            }
            None => false,
        }
    }

    pub fn request_delete(&self, id: &str) -> bool {
        match self.entry(id) {
            Some(entry) => {
                entry.status.request_delete();
                true
            }
            None => false,
        }
    }

    pub fn dismiss_delete(&self, id: &str) {
        if let Some(entry) = self.entry(id) {
            entry.status.dismiss_delete();
        }
    }

    pub async fn confirm_delete(&mut self, id: &str) -> DeleteOutcome {
        let mut deleted: Option<String> = None;
        let outcome = match self.entries.iter().find(|e| e.record.id == id) {
            Some(entry) => {
                entry
                    .status
                    .confirm_delete(&self.ctx, |id| deleted = Some(id.to_string()))
                    .await
            }
            None => DeleteOutcome::NotRequested,
        };
        if let Some(id) = deleted {
            self.remove_bin(&id);
        }
        outcome
    }

    /// Drops `id` from the list, unmounting its display. Absent ids are
    /// ignored.
    pub fn remove_bin(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.record.id != id);
        before != self.entries.len()
    }

    /// Leaves the screen, releasing every feed subscription.
    pub fn unmount(&self) {
        self.lifecycle.unmount();
        for entry in &self.entries {
            entry.status.unmount();
        }
    }
}

pub struct CreateBinScreen {
    ctx: AppContext,
    lifecycle: ScreenLifecycle,
}

impl CreateBinScreen {
    pub fn open(ctx: &AppContext) -> Result<Self, Route> {
        let lifecycle = ScreenLifecycle::enter(ctx, Route::CreateBin)?;
        Ok(Self {
            ctx: ctx.clone(),
            lifecycle,
        })
    }

    pub fn schema(&self) -> &'static FormSchema {
        &CREATE_BIN_FORM
    }

    pub async fn submit(&self, values: &FormValues) -> SubmitOutcome<MessageReply> {
        let fields = bin_fields(values);
        let api = self.ctx.api.clone();
        let outcome = submit_validated(
            &CREATE_BIN_FORM,
            values,
            &self.ctx,
            &self.lifecycle,
            BIN_CREATE_FAILURE,
            || async move { api.create_bin(&fields?).await },
        )
        .await;

        if let SubmitOutcome::Submitted(reply) = &outcome {
            announce(&self.ctx, &reply.message, "Bin created successfully");
            self.ctx.navigator().navigate(Route::Bins);
        }
        outcome
    }

    pub fn unmount(&self) {
        self.lifecycle.unmount();
    }
}

pub struct EditBinScreen {
    ctx: AppContext,
    lifecycle: ScreenLifecycle,
    id: String,
    values: FormValues,
}

impl EditBinScreen {
    pub fn open(ctx: &AppContext, id: &str) -> Result<Self, Route> {
        let lifecycle = ScreenLifecycle::enter(ctx, Route::EditBin(id.to_string()))?;
        Ok(Self {
            ctx: ctx.clone(),
            lifecycle,
            id: id.to_string(),
            values: FormValues::new(),
        })
    }

    pub fn schema(&self) -> &'static FormSchema {
        &EDIT_BIN_FORM
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub async fn load(&mut self) -> bool {
        let Some(result) = self.lifecycle.run(self.ctx.api.get_bin(&self.id)).await else {
            return false;
        };
        match result {
            Ok(reply) => {
                let bin = reply.data;
                self.values = FormValues::new()
                    .with("binName", bin.bin_name)
                    .with("binLocation", bin.bin_location)
                    .with("binColor", bin.bin_color.as_str());
                if !reply.message.trim().is_empty() {
                    self.ctx.notifier.success(reply.message);
                }
                true
            }
            Err(e) => {
                self.ctx.report(&e, BIN_FETCH_FAILURE);
                false
            }
        }
    }

    pub async fn submit(&self, values: &FormValues) -> SubmitOutcome<MessageReply> {
        let fields = bin_fields(values);
        let api = self.ctx.api.clone();
        let id = self.id.clone();
        let outcome = submit_validated(
            &EDIT_BIN_FORM,
            values,
            &self.ctx,
            &self.lifecycle,
            BIN_UPDATE_FAILURE,
            || async move { api.update_bin(&id, &fields?).await },
        )
        .await;

        if let SubmitOutcome::Submitted(reply) = &outcome {
            announce(&self.ctx, &reply.message, "Bin updated successfully");
            self.ctx.navigator().navigate(Route::Bins);
        }
        outcome
    }

    pub fn unmount(&self) {
        self.lifecycle.unmount();
    }
}
