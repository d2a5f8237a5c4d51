// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end synchronization tests against an in-memory remote API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use nestor_lib::command::DeviceCommand;
use nestor_lib::protocol::{ClientCredentials, RemoteApi, TokenGrant};
use nestor_lib::push::{DeviceChangeEvent, PushListener, PushTransport};
use nestor_lib::state::{
    Device, DeviceType, SetpointTrait, SettingsTrait, ThermostatModeTrait, TraitPayload,
};
use nestor_lib::types::{DeviceId, TemperatureScale, ThermostatMode, celsius_to_fahrenheit};
use nestor_lib::{Client, ClientConfig, Result, StoredCredentials};
use parking_lot::Mutex;
use serde_json::json;

const THERMO: &str = "enterprises/p/devices/thermo";

/// Remote API double that records every call.
#[derive(Clone)]
struct FakeCloud(Arc<CloudState>);

struct CloudState {
    devices: Mutex<Vec<Device>>,
    commands: Mutex<Vec<DeviceCommand>>,
    refreshes: AtomicU32,
    accept_commands: AtomicBool,
}

impl FakeCloud {
    fn with(device: Device) -> Self {
        Self(Arc::new(CloudState {
            devices: Mutex::new(vec![device]),
            commands: Mutex::new(Vec::new()),
            refreshes: AtomicU32::new(0),
            accept_commands: AtomicBool::new(true),
        }))
    }
}

impl std::ops::Deref for FakeCloud {
    type Target = CloudState;

    fn deref(&self) -> &CloudState {
        &self.0
    }
}

impl RemoteApi for FakeCloud {
    async fn fetch_devices(&self, _: &str, _: &str) -> Result<Vec<Device>> {
        Ok(self.devices.lock().clone())
    }

    async fn execute_command(
        &self,
        _: &DeviceId,
        _: &str,
        command: &DeviceCommand,
    ) -> Result<bool> {
        self.commands.lock().push(command.clone());
        Ok(self.accept_commands.load(Ordering::SeqCst))
    }

    async fn exchange_auth_code(
        &self,
        _: &ClientCredentials,
        _: &str,
        _: &str,
    ) -> Result<TokenGrant> {
        Ok(grant(None))
    }

    async fn refresh_access_token(&self, _: &ClientCredentials, _: &str) -> Result<TokenGrant> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(grant(None))
    }
}

fn grant(refresh_token: Option<&str>) -> TokenGrant {
    TokenGrant {
        access_token: "access".to_string(),
        refresh_token: refresh_token.map(str::to_owned),
        expires_in: Duration::from_secs(3600),
        scope: None,
    }
}

/// Push transport double that hands the listener back to the test.
#[derive(Clone, Default)]
struct CapturedPush(Arc<Mutex<Option<PushListener>>>);

impl CapturedPush {
    fn listener(&self) -> PushListener {
        self.0.lock().clone().expect("push was started")
    }
}

impl PushTransport for CapturedPush {
    async fn start(&self, _: &[String], _: &str, listener: PushListener) -> Result<()> {
        *self.0.lock() = Some(listener);
        Ok(())
    }
}

fn thermostat(mode: ThermostatMode, scale: TemperatureScale, setpoint: SetpointTrait) -> Device {
    Device::new(THERMO, DeviceType::Thermostat)
        .with_trait(TraitPayload::ThermostatMode(ThermostatModeTrait {
            mode,
            available_modes: vec![
                ThermostatMode::Heat,
                ThermostatMode::Cool,
                ThermostatMode::HeatCool,
                ThermostatMode::Off,
            ],
        }))
        .with_trait(TraitPayload::Settings(SettingsTrait {
            temperature_scale: scale,
        }))
        .with_trait(TraitPayload::ThermostatTemperatureSetpoint(setpoint))
}

fn heat_at(celsius: f64) -> SetpointTrait {
    SetpointTrait {
        heat_celsius: Some(celsius),
        cool_celsius: None,
    }
}

async fn client(device: Device) -> (FakeCloud, CapturedPush, Client<FakeCloud, CapturedPush>) {
    let cloud = FakeCloud::with(device);
    let push = CapturedPush::default();
    let client = Client::resume(
        ClientConfig::new("id", "secret", "p"),
        StoredCredentials::new("refresh", vec![]),
        cloud.clone(),
        push.clone(),
        |_| {},
    )
    .await
    .unwrap();
    (cloud, push, client)
}

fn id() -> DeviceId {
    DeviceId::new(THERMO)
}

#[tokio::test]
async fn opposite_deltas_return_to_the_exact_setpoint() {
    let (cloud, _, client) = client(thermostat(
        ThermostatMode::Heat,
        TemperatureScale::Fahrenheit,
        heat_at(20.0),
    ))
    .await;
    let facade = client.thermostat(THERMO).unwrap();
    let original = facade.setpoint_exact().unwrap();
    assert!((original - 68.0).abs() < 1e-9);

    assert!(client.commands().set_temperature_delta(&id(), 2).await.unwrap());
    assert_eq!(facade.setpoint(), Some(70.0));
    assert!(client.commands().set_temperature_delta(&id(), -2).await.unwrap());

    assert_eq!(
        *cloud.commands.lock(),
        vec![
            DeviceCommand::SetHeat { heat_celsius: 21.1 },
            DeviceCommand::SetHeat { heat_celsius: 20.0 },
        ]
    );
    assert!((facade.setpoint_exact().unwrap() - original).abs() < 1e-9);
}

#[tokio::test]
async fn fahrenheit_value_is_sent_as_rounded_celsius() {
    let (cloud, _, client) = client(thermostat(
        ThermostatMode::Heat,
        TemperatureScale::Fahrenheit,
        heat_at(20.0),
    ))
    .await;

    assert!(client.commands().set_temperature(&id(), 72.0).await.unwrap());

    assert_eq!(
        *cloud.commands.lock(),
        vec![DeviceCommand::SetHeat { heat_celsius: 22.2 }]
    );
    let back = celsius_to_fahrenheit(22.2);
    assert!((back - 72.0).abs() < 1.0);
}

#[tokio::test]
async fn heat_cool_rejects_single_setpoint() {
    let (cloud, _, client) = client(thermostat(
        ThermostatMode::HeatCool,
        TemperatureScale::Celsius,
        SetpointTrait {
            heat_celsius: Some(19.0),
            cool_celsius: Some(25.0),
        },
    ))
    .await;
    let before = client.store().get(&id());

    assert!(!client.commands().set_temperature(&id(), 21.0).await.unwrap());

    assert!(cloud.commands.lock().is_empty());
    assert_eq!(client.store().get(&id()), before);
}

#[tokio::test]
async fn refused_command_leaves_snapshot_unchanged() {
    let (cloud, _, client) = client(thermostat(
        ThermostatMode::Cool,
        TemperatureScale::Celsius,
        SetpointTrait {
            heat_celsius: None,
            cool_celsius: Some(24.0),
        },
    ))
    .await;
    cloud.accept_commands.store(false, Ordering::SeqCst);
    let before = client.store().get(&id());

    assert!(!client.commands().set_temperature(&id(), 22.0).await.unwrap());

    assert_eq!(cloud.commands.lock().len(), 1);
    assert_eq!(client.store().get(&id()), before);
}

#[tokio::test]
async fn push_overwrites_optimistic_update() {
    let (_, push, client) = client(thermostat(
        ThermostatMode::Heat,
        TemperatureScale::Celsius,
        heat_at(20.0),
    ))
    .await;
    let facade = client.thermostat(THERMO).unwrap();

    assert!(client.commands().set_temperature(&id(), 23.0).await.unwrap());
    assert_eq!(facade.setpoint(), Some(23.0));

    let listener = push.listener();
    listener.handle_event(&DeviceChangeEvent::new(
        THERMO,
        "sdm.devices.traits.ThermostatTemperatureSetpoint",
        json!({"heatCelsius": 22.5}),
    ));

    assert_eq!(facade.setpoint(), Some(22.5));
}

#[tokio::test]
async fn two_facades_see_one_push() {
    let (_, push, client) = client(thermostat(
        ThermostatMode::Heat,
        TemperatureScale::Celsius,
        heat_at(20.0),
    ))
    .await;
    let hits = Arc::new(AtomicU32::new(0));

    let mut first = client.thermostat(THERMO).unwrap();
    let mut second = client.thermostat(THERMO).unwrap();
    for facade in [&mut first, &mut second] {
        let hits = hits.clone();
        facade.on_change(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }

    let listener = push.listener();
    listener.handle_event(&DeviceChangeEvent::new(
        THERMO,
        "sdm.devices.traits.Temperature",
        json!({"ambientTemperatureCelsius": 21.5}),
    ));

    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // After rebinding, events for the old device no longer arrive
    first.rebind("enterprises/p/devices/other");
    listener.handle_event(&DeviceChangeEvent::new(
        THERMO,
        "sdm.devices.traits.Temperature",
        json!({"ambientTemperatureCelsius": 21.0}),
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn concurrent_commands_share_one_refresh() {
    let (cloud, _, client) = client(thermostat(
        ThermostatMode::Heat,
        TemperatureScale::Celsius,
        heat_at(20.0),
    ))
    .await;
    assert_eq!(cloud.refreshes.load(Ordering::SeqCst), 1);

    // Move past expiry minus the safety margin
    tokio::time::advance(Duration::from_secs(3595)).await;

    let client = Arc::new(client);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .commands()
                    .set_temperature(&id(), 20.0 + f64::from(i) / 10.0)
                    .await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    assert_eq!(cloud.refreshes.load(Ordering::SeqCst), 2);
    assert_eq!(cloud.commands.lock().len(), 8);
}
