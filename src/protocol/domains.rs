//! Typed interfaces for the protocol domains, limited to the methods the
//! debugger issues.

use super::client::ProtocolClient;
use super::types::*;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

async fn invoke<R: DeserializeOwned>(
    client: &dyn ProtocolClient,
    method: &str,
    params: impl Serialize,
) -> Result<R> {
    let params = serde_json::to_value(params)?;
    let value = client.call(method, params).await?;
    Ok(serde_json::from_value(value)?)
}

async fn invoke_unit(client: &dyn ProtocolClient, method: &str, params: Value) -> Result<()> {
    client.call(method, params).await?;
    Ok(())
}

pub struct DebuggerDomain<'a> {
    client: &'a dyn ProtocolClient,
}

impl<'a> DebuggerDomain<'a> {
    pub fn new(client: &'a dyn ProtocolClient) -> Self {
        Self { client }
    }

    pub async fn enable(&self) -> Result<()> {
        invoke_unit(self.client, "Debugger.enable", json!({})).await
    }

    pub async fn set_pause_on_exceptions(&self, state: PauseOnExceptionsState) -> Result<()> {
        invoke_unit(
            self.client,
            "Debugger.setPauseOnExceptions",
            json!({ "state": state }),
        )
        .await
    }

    pub async fn set_async_call_stack_depth(&self, max_depth: u32) -> Result<()> {
        invoke_unit(
            self.client,
            "Debugger.setAsyncCallStackDepth",
            json!({ "maxDepth": max_depth }),
        )
        .await
    }

    pub async fn set_blackbox_patterns(&self, patterns: &[String]) -> Result<()> {
        invoke_unit(
            self.client,
            "Debugger.setBlackboxPatterns",
            json!({ "patterns": patterns }),
        )
        .await
    }

    pub async fn set_breakpoint(
        &self,
        location: Location,
        condition: Option<String>,
    ) -> Result<SetBreakpointResult> {
        invoke(
            self.client,
            "Debugger.setBreakpoint",
            SetBreakpointParams {
                location,
                condition,
            },
        )
        .await
    }

    pub async fn set_breakpoint_by_url(
        &self,
        url_regex: String,
        line_number: u32,
        condition: Option<String>,
    ) -> Result<SetBreakpointByUrlResult> {
        invoke(
            self.client,
            "Debugger.setBreakpointByUrl",
            SetBreakpointByUrlParams {
                url_regex,
                line_number,
                condition,
            },
        )
        .await
    }

    pub async fn remove_breakpoint(&self, breakpoint_id: &str) -> Result<()> {
        invoke_unit(
            self.client,
            "Debugger.removeBreakpoint",
            json!({ "breakpointId": breakpoint_id }),
        )
        .await
    }

    pub async fn resume(&self) -> Result<()> {
        invoke_unit(self.client, "Debugger.resume", json!({})).await
    }

    pub async fn step_over(&self) -> Result<()> {
        invoke_unit(self.client, "Debugger.stepOver", json!({})).await
    }

    pub async fn step_into(&self) -> Result<()> {
        invoke_unit(self.client, "Debugger.stepInto", json!({})).await
    }

    pub async fn step_out(&self) -> Result<()> {
        invoke_unit(self.client, "Debugger.stepOut", json!({})).await
    }

    pub async fn pause(&self) -> Result<()> {
        invoke_unit(self.client, "Debugger.pause", json!({})).await
    }

    pub async fn get_script_source(&self, script_id: &str) -> Result<String> {
        let result: GetScriptSourceResult = invoke(
            self.client,
            "Debugger.getScriptSource",
            json!({ "scriptId": script_id }),
        )
        .await?;
        Ok(result.script_source)
    }

    pub async fn evaluate_on_call_frame(
        &self,
        call_frame_id: &str,
        evaluate: EvaluateParams,
    ) -> Result<EvaluateResult> {
        invoke(
            self.client,
            "Debugger.evaluateOnCallFrame",
            EvaluateOnCallFrameParams {
                call_frame_id: call_frame_id.to_string(),
                evaluate,
            },
        )
        .await
    }
}

pub struct RuntimeDomain<'a> {
    client: &'a dyn ProtocolClient,
}

impl<'a> RuntimeDomain<'a> {
    pub fn new(client: &'a dyn ProtocolClient) -> Self {
        Self { client }
    }

    pub async fn enable(&self) -> Result<()> {
        invoke_unit(self.client, "Runtime.enable", json!({})).await
    }

    pub async fn evaluate(&self, params: EvaluateParams) -> Result<EvaluateResult> {
        invoke(self.client, "Runtime.evaluate", params).await
    }

    pub async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>> {
        let result: GetPropertiesResult = invoke(
            self.client,
            "Runtime.getProperties",
            json!({ "objectId": object_id, "generatePreview": true }),
        )
        .await?;
        Ok(result.result)
    }

    pub async fn run_if_waiting_for_debugger(&self) -> Result<()> {
        invoke_unit(self.client, "Runtime.runIfWaitingForDebugger", json!({})).await
    }
}

pub struct ProfilerDomain<'a> {
    client: &'a dyn ProtocolClient,
}

impl<'a> ProfilerDomain<'a> {
    pub fn new(client: &'a dyn ProtocolClient) -> Self {
        Self { client }
    }

    pub async fn enable(&self) -> Result<()> {
        invoke_unit(self.client, "Profiler.enable", json!({})).await
    }

    pub async fn set_sampling_interval(&self, interval: u32) -> Result<()> {
        invoke_unit(
            self.client,
            "Profiler.setSamplingInterval",
            json!({ "interval": interval }),
        )
        .await
    }

    pub async fn start(&self) -> Result<()> {
        invoke_unit(self.client, "Profiler.start", json!({})).await
    }

    pub async fn stop(&self) -> Result<Value> {
        let result: ProfilerStopResult = invoke(self.client, "Profiler.stop", json!({})).await?;
        Ok(result.profile)
    }
}
